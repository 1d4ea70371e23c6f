use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::auth::{role_rights, verify_jwt, Right, TokenType};
use crate::database::schema::ID_FIELD;
use crate::database::Record;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context, loaded fresh from the store on every request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub role: String,
    pub record: Record,
}

impl AuthUser {
    pub fn from_record(record: Record) -> Option<Self> {
        let id = record.get(ID_FIELD).and_then(Value::as_str)?.to_string();
        let role = record
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self { id, role, record })
    }

    pub fn has_rights(&self, required: &[Right]) -> bool {
        let granted = role_rights(&self.role);
        required.iter().all(|r| granted.contains(r))
    }

    /// Require every right in `required`, unless the request targets the
    /// caller's own user record.
    pub fn require_rights(&self, required: &[Right], target_user_id: Option<&str>) -> Result<(), ApiError> {
        if self.has_rights(required) || target_user_id == Some(self.id.as_str()) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Forbidden"))
        }
    }
}

/// Validates the bearer access token and injects [`AuthUser`]
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(|msg| {
        tracing::debug!("rejecting request: {}", msg);
        ApiError::please_authenticate()
    })?;

    let claims = verify_jwt(&token, &state.config.jwt.secret, TokenType::Access)?;

    let record = state
        .users()
        .get_user_by_id(&claims.sub)
        .await?
        .ok_or_else(ApiError::please_authenticate)?;
    let auth_user = AuthUser::from_record(record).ok_or_else(ApiError::please_authenticate)?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
