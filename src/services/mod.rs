pub mod auth_service;
pub mod email_service;
pub mod entity_service;
pub mod search;
pub mod token_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use email_service::{EmailComposer, EmailError, EmailMessage, EmailSender, LogMailer};
pub use entity_service::{EntityService, ServiceResult};
pub use search::{ProjectSearch, TaskSearch, TeamSearch, UserSearch};
pub use token_service::{AuthTokens, TokenInfo, TokenService};
pub use user_service::UserService;
