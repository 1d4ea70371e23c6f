use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::auth::{verify_password, TokenType};
use crate::config::AppConfig;
use crate::database::schema::ID_FIELD;
use crate::database::{EntityStore, Record};
use crate::error::ApiError;
use crate::services::email_service::{EmailComposer, EmailSender};
use crate::services::entity_service::ServiceResult;
use crate::services::token_service::{AuthTokens, TokenService};
use crate::services::user_service::UserService;

/// Register / login / token rotation / password reset / email verification.
pub struct AuthService {
    config: Arc<AppConfig>,
    users: UserService,
    tokens: TokenService,
    mailer: Arc<dyn EmailSender>,
}

impl AuthService {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn EntityStore>, mailer: Arc<dyn EmailSender>) -> Self {
        Self {
            users: UserService::new(store.clone()),
            tokens: TokenService::new(store, config.jwt.clone()),
            config,
            mailer,
        }
    }

    pub async fn register(&self, body: Record) -> ServiceResult<(Record, AuthTokens)> {
        let user = self.users.create_user(body).await?;
        let tokens = self.tokens.generate_auth_tokens(user_id(&user)?).await?;
        Ok((user, tokens))
    }

    pub async fn login_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> ServiceResult<(Record, AuthTokens)> {
        let user = self
            .users
            .get_user_by_email(email)
            .await?
            .filter(|user| {
                user.get("password")
                    .and_then(Value::as_str)
                    .is_some_and(|hash| verify_password(password, hash))
            })
            .ok_or_else(|| ApiError::unauthorized("Incorrect email or password"))?;

        let tokens = self.tokens.generate_auth_tokens(user_id(&user)?).await?;
        Ok((user, tokens))
    }

    pub async fn logout(&self, refresh_token: &str) -> ServiceResult<()> {
        let doc = self
            .tokens
            .find_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| ApiError::not_found("Not found"))?;
        self.tokens.delete_token(&doc).await
    }

    /// Trade a refresh token for a new pair; the old one is consumed.
    pub async fn refresh_auth(&self, refresh_token: &str) -> ServiceResult<AuthTokens> {
        self.try_refresh_auth(refresh_token).await.map_err(|err| {
            debug!("refresh failed: {}", err);
            ApiError::please_authenticate()
        })
    }

    async fn try_refresh_auth(&self, refresh_token: &str) -> ServiceResult<AuthTokens> {
        let doc = self.tokens.verify_token(refresh_token, TokenType::Refresh).await?;
        let user = self.user_for_token(&doc).await?;
        self.tokens.delete_token(&doc).await?;
        self.tokens.generate_auth_tokens(user_id(&user)?).await
    }

    pub async fn forgot_password(&self, email: &str) -> ServiceResult<()> {
        let user = self
            .users
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| ApiError::not_found("No users found with this email"))?;

        let token = self.tokens.generate_reset_password_token(user_id(&user)?).await?;
        let message = EmailComposer::new(&self.config.email)
            .reset_password(email_of(&user), &token)
            .map_err(mail_error)?;
        self.mailer.send(message).await.map_err(mail_error)
    }

    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> ServiceResult<()> {
        self.try_reset_password(reset_token, new_password)
            .await
            .map_err(|err| match err {
                // a weak password is still the caller's problem to fix
                ApiError::ValidationError { .. } => err,
                other => {
                    debug!("password reset failed: {}", other);
                    ApiError::unauthorized("Password reset failed")
                }
            })
    }

    async fn try_reset_password(&self, reset_token: &str, new_password: &str) -> ServiceResult<()> {
        let doc = self.tokens.verify_token(reset_token, TokenType::ResetPassword).await?;
        let user = self.user_for_token(&doc).await?;
        let id = user_id(&user)?;

        let patch = json!({ "password": new_password });
        self.users
            .update_user_by_id(id, patch.as_object().cloned().unwrap_or_default())
            .await?;
        self.tokens.delete_user_tokens(id, TokenType::ResetPassword).await?;
        Ok(())
    }

    pub async fn send_verification_email(&self, user: &Record) -> ServiceResult<()> {
        let token = self.tokens.generate_verify_email_token(user_id(user)?).await?;
        let message = EmailComposer::new(&self.config.email)
            .verify_email(email_of(user), &token)
            .map_err(mail_error)?;
        self.mailer.send(message).await.map_err(mail_error)
    }

    pub async fn verify_email(&self, verify_token: &str) -> ServiceResult<()> {
        self.try_verify_email(verify_token).await.map_err(|err| {
            debug!("email verification failed: {}", err);
            ApiError::unauthorized("Email verification failed")
        })
    }

    async fn try_verify_email(&self, verify_token: &str) -> ServiceResult<()> {
        let doc = self.tokens.verify_token(verify_token, TokenType::VerifyEmail).await?;
        let user = self.user_for_token(&doc).await?;
        let id = user_id(&user)?;

        self.tokens.delete_user_tokens(id, TokenType::VerifyEmail).await?;
        let patch = json!({ "isEmailVerified": true });
        self.users
            .update_user_by_id(id, patch.as_object().cloned().unwrap_or_default())
            .await?;
        Ok(())
    }

    async fn user_for_token(&self, token_doc: &Record) -> ServiceResult<Record> {
        let id = token_doc
            .get("user")
            .and_then(Value::as_str)
            .ok_or_else(ApiError::please_authenticate)?;
        self.users
            .get_user_by_id(id)
            .await?
            .ok_or_else(ApiError::please_authenticate)
    }
}

fn user_id(user: &Record) -> ServiceResult<&str> {
    user.get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::internal_server_error("User record has no id"))
}

fn email_of(user: &Record) -> &str {
    user.get("email").and_then(Value::as_str).unwrap_or_default()
}

fn mail_error(err: crate::services::email_service::EmailError) -> ApiError {
    warn!("email not sent: {}", err);
    ApiError::internal_server_error("Failed to send email")
}
