// Endpoints behind jwt_auth_middleware; each handler receives the AuthUser
// extension and checks its own rights.
pub mod auth;
pub mod entity;
pub mod logs;
pub mod projects;
pub mod tasks;
pub mod teams;
pub mod users;
