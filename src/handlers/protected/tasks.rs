use axum::extract::{Path, State};
use axum::Extension;
use serde_json::Value;

use super::entity;
use crate::database::models::TASK;
use crate::database::Page;
use crate::middleware::{ApiResult, AuthUser, ValidatedJson, ValidatedQuery};
use crate::services::TaskSearch;
use crate::state::AppState;
use crate::validations::task::{CreateTaskBody, ListTasksQuery, UpdateTaskBody};
use crate::validations::{split_list_query, to_record};

/// POST /v1/tasks
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<CreateTaskBody>,
) -> ApiResult<Value> {
    entity::create(&state, &user, &TASK, to_record(&body)?).await
}

/// GET /v1/tasks
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ListTasksQuery>,
) -> ApiResult<Page> {
    let (filter, options) = split_list_query(&query)?;
    entity::list(&state, &user, &TASK, filter, options).await
}

/// GET /v1/tasks/search
pub async fn search(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(search): ValidatedQuery<TaskSearch>,
) -> ApiResult<Vec<Value>> {
    entity::search(&state, &user, &TASK, search.to_filter()).await
}

/// GET /v1/tasks/:taskId
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
) -> ApiResult<Value> {
    entity::get(&state, &user, &TASK, "taskId", &task_id).await
}

/// PATCH /v1/tasks/:taskId
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateTaskBody>,
) -> ApiResult<Value> {
    entity::update(&state, &user, &TASK, "taskId", &task_id, to_record(&body)?).await
}

/// DELETE /v1/tasks/:taskId
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
) -> ApiResult<()> {
    entity::delete(&state, &user, &TASK, "taskId", &task_id).await
}
