pub mod auth;
pub mod response;
pub mod validation;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use validation::{Validate, ValidatedJson, ValidatedQuery};
