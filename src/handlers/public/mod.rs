// Endpoints reachable without a token.
pub mod auth;
