// handlers/mod.rs - route handlers by security tier
//
// Public (no auth) -> /v1/auth/*
// Protected (bearer access token) -> /v1/{users,teams,projects,tasks,logs}, send-verification-email

pub mod protected;
pub mod public;
