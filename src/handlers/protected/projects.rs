use axum::extract::{Path, State};
use axum::Extension;
use serde_json::Value;

use super::entity;
use crate::database::models::PROJECT;
use crate::database::Page;
use crate::middleware::{ApiResult, AuthUser, ValidatedJson, ValidatedQuery};
use crate::services::ProjectSearch;
use crate::state::AppState;
use crate::validations::project::{CreateProjectBody, ListProjectsQuery, UpdateProjectBody};
use crate::validations::{split_list_query, to_record};

/// POST /v1/projects
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<CreateProjectBody>,
) -> ApiResult<Value> {
    entity::create(&state, &user, &PROJECT, to_record(&body)?).await
}

/// GET /v1/projects
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ListProjectsQuery>,
) -> ApiResult<Page> {
    let (filter, options) = split_list_query(&query)?;
    entity::list(&state, &user, &PROJECT, filter, options).await
}

/// GET /v1/projects/search
pub async fn search(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(search): ValidatedQuery<ProjectSearch>,
) -> ApiResult<Vec<Value>> {
    entity::search(&state, &user, &PROJECT, search.to_filter()).await
}

/// GET /v1/projects/:projectId
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<String>,
) -> ApiResult<Value> {
    entity::get(&state, &user, &PROJECT, "projectId", &project_id).await
}

/// PATCH /v1/projects/:projectId
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateProjectBody>,
) -> ApiResult<Value> {
    entity::update(&state, &user, &PROJECT, "projectId", &project_id, to_record(&body)?).await
}

/// DELETE /v1/projects/:projectId
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(project_id): Path<String>,
) -> ApiResult<()> {
    entity::delete(&state, &user, &PROJECT, "projectId", &project_id).await
}
