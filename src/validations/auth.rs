use serde::{Deserialize, Serialize};

use super::FieldErrors;
use crate::error::ApiError;
use crate::middleware::Validate;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RegisterBody {
    pub name: String,
    pub last_name: String,
    pub email: String,
    /// Accepted for compatibility with older clients; not stored.
    #[serde(default, skip_serializing)]
    pub phone_number: Option<String>,
    pub password: String,
}

impl Validate for RegisterBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.required("lastName", &self.last_name);
        errors.required("email", &self.email);
        errors.email("email", Some(&self.email));
        errors.password("password", Some(&self.password));
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

impl Validate for LoginBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("email", &self.email);
        errors.required("password", &self.password);
        errors.finish()
    }
}

/// Body of `logout` and `refresh-tokens`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RefreshTokenBody {
    pub refresh_token: String,
}

impl Validate for RefreshTokenBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("refreshToken", &self.refresh_token);
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgotPasswordBody {
    pub email: String,
}

impl Validate for ForgotPasswordBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("email", &self.email);
        errors.email("email", Some(&self.email));
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordBody {
    pub password: String,
}

impl Validate for ResetPasswordBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.password("password", Some(&self.password));
        errors.finish()
    }
}

/// `?token=` on reset-password and verify-email.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenQuery {
    pub token: String,
}

impl Validate for TokenQuery {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.required("token", &self.token);
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_checks_email_and_password() {
        let body: RegisterBody = serde_json::from_value(json!({
            "name": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example",
            "password": "password"
        }))
        .unwrap();
        let err = body.validate().unwrap_err().to_json();
        assert!(err["field_errors"]["email"].is_string());
        assert!(err["field_errors"]["password"].is_string());
    }

    #[test]
    fn register_phone_number_is_not_stored() {
        let body: RegisterBody = serde_json::from_value(json!({
            "name": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "phoneNumber": "555-0100",
            "password": "password1"
        }))
        .unwrap();
        assert!(body.validate().is_ok());
        let record = super::super::to_record(&body).unwrap();
        assert!(!record.contains_key("phoneNumber"));
        assert_eq!(record["lastName"], "Lovelace");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed = serde_json::from_value::<LoginBody>(json!({
            "email": "a@b.co",
            "password": "x",
            "role": "admin"
        }));
        assert!(parsed.is_err());
    }
}
