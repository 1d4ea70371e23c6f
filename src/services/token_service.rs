use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::auth::{generate_jwt, verify_jwt, Claims, TokenError, TokenType};
use crate::config::JwtConfig;
use crate::database::models::TOKEN;
use crate::database::{EntityStore, Record, Repository};
use crate::error::ApiError;
use crate::services::entity_service::ServiceResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token: String,
    pub expires: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access: TokenInfo,
    pub refresh: TokenInfo,
}

/// Issues signed tokens and tracks the persisted ones (refresh, reset
/// password, verify email) by their SHA-256 digest.
#[derive(Clone)]
pub struct TokenService {
    repo: Repository,
    jwt: JwtConfig,
}

impl TokenService {
    pub fn new(store: Arc<dyn EntityStore>, jwt: JwtConfig) -> Self {
        Self { repo: Repository::new(&TOKEN, store), jwt }
    }

    pub fn generate_token(
        &self,
        user_id: &str,
        expires: DateTime<Utc>,
        token_type: TokenType,
    ) -> Result<String, TokenError> {
        generate_jwt(&Claims::new(user_id, expires, token_type), &self.jwt.secret)
    }

    pub async fn save_token(
        &self,
        token: &str,
        user_id: &str,
        expires: DateTime<Utc>,
        token_type: TokenType,
    ) -> ServiceResult<Record> {
        let body = json!({
            "token": hash_token(token),
            "user": user_id,
            "type": token_type.as_str(),
            "expires": format_expiry(expires),
            "blacklisted": false
        });
        let body = body.as_object().cloned().unwrap_or_default();
        Ok(self.repo.create(body).await?)
    }

    /// Check signature, expiry and type, then require a live stored copy.
    pub async fn verify_token(&self, token: &str, token_type: TokenType) -> ServiceResult<Record> {
        let claims = verify_jwt(token, &self.jwt.secret, token_type)?;
        self.repo
            .find_one(json!({
                "token": hash_token(token),
                "type": token_type.as_str(),
                "user": claims.sub,
                "blacklisted": false
            }))
            .await?
            .ok_or_else(|| ApiError::not_found("Token not found"))
    }

    pub async fn find_refresh_token(&self, token: &str) -> ServiceResult<Option<Record>> {
        Ok(self
            .repo
            .find_one(json!({
                "token": hash_token(token),
                "type": TokenType::Refresh.as_str(),
                "blacklisted": false
            }))
            .await?)
    }

    pub async fn delete_token(&self, token_doc: &Record) -> ServiceResult<()> {
        if let Some(id) = token_doc.get("_id").and_then(Value::as_str) {
            self.repo.delete_by_id(id).await?;
        }
        Ok(())
    }

    pub async fn delete_user_tokens(&self, user_id: &str, token_type: TokenType) -> ServiceResult<u64> {
        Ok(self
            .repo
            .delete_many(&json!({ "user": user_id, "type": token_type.as_str() }))
            .await?)
    }

    /// Fresh access token plus a persisted refresh token.
    pub async fn generate_auth_tokens(&self, user_id: &str) -> ServiceResult<AuthTokens> {
        let now = Utc::now();
        let access_expires = now + Duration::minutes(self.jwt.access_expiration_minutes);
        let access_token = self.generate_token(user_id, access_expires, TokenType::Access)?;

        let refresh_expires = now + Duration::days(self.jwt.refresh_expiration_days);
        let refresh_token = self.generate_token(user_id, refresh_expires, TokenType::Refresh)?;
        self.save_token(&refresh_token, user_id, refresh_expires, TokenType::Refresh)
            .await?;

        Ok(AuthTokens {
            access: TokenInfo { token: access_token, expires: format_expiry(access_expires) },
            refresh: TokenInfo { token: refresh_token, expires: format_expiry(refresh_expires) },
        })
    }

    pub async fn generate_reset_password_token(&self, user_id: &str) -> ServiceResult<String> {
        let expires = Utc::now() + Duration::minutes(self.jwt.reset_password_expiration_minutes);
        self.issue_one_time(user_id, expires, TokenType::ResetPassword).await
    }

    pub async fn generate_verify_email_token(&self, user_id: &str) -> ServiceResult<String> {
        let expires = Utc::now() + Duration::minutes(self.jwt.verify_email_expiration_minutes);
        self.issue_one_time(user_id, expires, TokenType::VerifyEmail).await
    }

    async fn issue_one_time(
        &self,
        user_id: &str,
        expires: DateTime<Utc>,
        token_type: TokenType,
    ) -> ServiceResult<String> {
        let token = self.generate_token(user_id, expires, token_type)?;
        self.save_token(&token, user_id, expires, token_type).await?;
        Ok(token)
    }
}

/// Hex SHA-256 of a token; the raw JWT is never stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn format_expiry(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
