use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod roles;

pub use roles::{role_rights, Right};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Access,
    Refresh,
    ResetPassword,
    VerifyEmail,
}

impl TokenType {
    /// Name stored in the tokens collection and in the `type` claim.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
            TokenType::ResetPassword => "resetPassword",
            TokenType::VerifyEmail => "verifyEmail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

impl Claims {
    pub fn new(user_id: impl Into<String>, expires: DateTime<Utc>, token_type: TokenType) -> Self {
        Self {
            sub: user_id.into(),
            iat: Utc::now().timestamp(),
            exp: expires.timestamp(),
            token_type,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Encode(String),

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Expected a {expected} token")]
    WrongType { expected: &'static str },
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::Encode("JWT secret not configured".to_string()));
    }
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| TokenError::Encode(e.to_string()))
}

/// Decode and check signature and expiry; the `type` claim must match.
pub fn verify_jwt(token: &str, secret: &str, expected: TokenType) -> Result<Claims, TokenError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| TokenError::Invalid(e.to_string()))?
        .claims;

    if claims.token_type != expected {
        return Err(TokenError::WrongType { expected: expected.as_str() });
    }
    Ok(claims)
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// False for a wrong password or an unparseable stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "test-secret";

    #[test]
    fn roundtrips_claims_with_type() {
        let claims = Claims::new("u1", Utc::now() + Duration::minutes(30), TokenType::Refresh);
        let token = generate_jwt(&claims, SECRET).unwrap();
        let decoded = verify_jwt(&token, SECRET, TokenType::Refresh).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn type_claim_is_camel_case() {
        let claims = Claims::new("u1", Utc::now(), TokenType::ResetPassword);
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["type"], "resetPassword");
    }

    #[test]
    fn rejects_wrong_type_secret_and_expiry() {
        let claims = Claims::new("u1", Utc::now() + Duration::minutes(5), TokenType::Access);
        let token = generate_jwt(&claims, SECRET).unwrap();
        assert!(matches!(
            verify_jwt(&token, SECRET, TokenType::Refresh),
            Err(TokenError::WrongType { .. })
        ));
        assert!(verify_jwt(&token, "other", TokenType::Access).is_err());

        let expired = Claims::new("u1", Utc::now() - Duration::minutes(5), TokenType::Access);
        let token = generate_jwt(&expired, SECRET).unwrap();
        assert!(verify_jwt(&token, SECRET, TokenType::Access).is_err());
    }

    #[test]
    fn hashes_and_verifies_passwords() {
        let hash = hash_password("password1").unwrap();
        assert_ne!(hash, "password1");
        assert!(verify_password("password1", &hash));
        assert!(!verify_password("password2", &hash));
        assert!(!verify_password("password1", "not-a-hash"));
    }
}
