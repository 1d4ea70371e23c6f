use axum::extract::{Path, State};
use axum::Extension;
use serde_json::Value;

use super::entity;
use crate::database::models::LOG;
use crate::database::Page;
use crate::middleware::{ApiResult, AuthUser, ValidatedJson, ValidatedQuery};
use crate::state::AppState;
use crate::validations::log::{ListLogsQuery, LogBody, UpdateLogBody};
use crate::validations::{split_list_query, to_record};

/// POST /v1/logs
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<LogBody>,
) -> ApiResult<Value> {
    entity::create(&state, &user, &LOG, to_record(&body)?).await
}

/// GET /v1/logs
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ListLogsQuery>,
) -> ApiResult<Page> {
    let (filter, options) = split_list_query(&query)?;
    entity::list(&state, &user, &LOG, filter, options).await
}

/// GET /v1/logs/:logId
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(log_id): Path<String>,
) -> ApiResult<Value> {
    entity::get(&state, &user, &LOG, "logId", &log_id).await
}

/// PATCH /v1/logs/:logId
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(log_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateLogBody>,
) -> ApiResult<Value> {
    entity::update(&state, &user, &LOG, "logId", &log_id, to_record(&body.0)?).await
}

/// DELETE /v1/logs/:logId
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(log_id): Path<String>,
) -> ApiResult<()> {
    entity::delete(&state, &user, &LOG, "logId", &log_id).await
}
