use axum::extract::State;
use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// POST /v1/auth/send-verification-email
pub async fn send_verification_email(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<()> {
    state.auth().send_verification_email(&user.record).await?;
    Ok(ApiResponse::no_content())
}
