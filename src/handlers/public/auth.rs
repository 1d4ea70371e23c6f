use axum::extract::State;
use serde_json::{json, Value};

use crate::api::format::present;
use crate::database::models::USER;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson, ValidatedQuery};
use crate::services::AuthTokens;
use crate::state::AppState;
use crate::validations::auth::{
    ForgotPasswordBody, LoginBody, RefreshTokenBody, RegisterBody, ResetPasswordBody, TokenQuery,
};
use crate::validations::to_record;

/// POST /v1/auth/register
pub async fn register(State(state): State<AppState>, ValidatedJson(body): ValidatedJson<RegisterBody>) -> ApiResult<Value> {
    let (user, tokens) = state.auth().register(to_record(&body)?).await?;
    Ok(ApiResponse::created(json!({ "user": present(user, &USER), "tokens": tokens })))
}

/// POST /v1/auth/login
pub async fn login(State(state): State<AppState>, ValidatedJson(body): ValidatedJson<LoginBody>) -> ApiResult<Value> {
    let (user, tokens) = state
        .auth()
        .login_with_email_and_password(&body.email, &body.password)
        .await?;
    Ok(ApiResponse::success(json!({ "user": present(user, &USER), "tokens": tokens })))
}

/// POST /v1/auth/logout
pub async fn logout(State(state): State<AppState>, ValidatedJson(body): ValidatedJson<RefreshTokenBody>) -> ApiResult<()> {
    state.auth().logout(&body.refresh_token).await?;
    Ok(ApiResponse::no_content())
}

/// POST /v1/auth/refresh-tokens
pub async fn refresh_tokens(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RefreshTokenBody>,
) -> ApiResult<AuthTokens> {
    let tokens = state.auth().refresh_auth(&body.refresh_token).await?;
    Ok(ApiResponse::success(tokens))
}

/// POST /v1/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ForgotPasswordBody>,
) -> ApiResult<()> {
    state.auth().forgot_password(&body.email).await?;
    Ok(ApiResponse::no_content())
}

/// POST /v1/auth/reset-password?token=
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<TokenQuery>,
    ValidatedJson(body): ValidatedJson<ResetPasswordBody>,
) -> ApiResult<()> {
    state.auth().reset_password(&query.token, &body.password).await?;
    Ok(ApiResponse::no_content())
}

/// POST /v1/auth/verify-email?token=
pub async fn verify_email(State(state): State<AppState>, ValidatedQuery(query): ValidatedQuery<TokenQuery>) -> ApiResult<()> {
    state.auth().verify_email(&query.token).await?;
    Ok(ApiResponse::no_content())
}
