use axum::extract::{Path, State};
use axum::Extension;
use serde_json::Value;

use super::entity;
use crate::database::models::TEAM;
use crate::database::Page;
use crate::middleware::{ApiResult, AuthUser, ValidatedJson, ValidatedQuery};
use crate::services::TeamSearch;
use crate::state::AppState;
use crate::validations::team::{CreateTeamBody, ListTeamsQuery, UpdateTeamBody};
use crate::validations::{split_list_query, to_record};

/// POST /v1/teams
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<CreateTeamBody>,
) -> ApiResult<Value> {
    entity::create(&state, &user, &TEAM, to_record(&body)?).await
}

/// GET /v1/teams
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ListTeamsQuery>,
) -> ApiResult<Page> {
    let (filter, options) = split_list_query(&query)?;
    entity::list(&state, &user, &TEAM, filter, options).await
}

/// GET /v1/teams/search
pub async fn search(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(search): ValidatedQuery<TeamSearch>,
) -> ApiResult<Vec<Value>> {
    entity::search(&state, &user, &TEAM, search.to_filter()).await
}

/// GET /v1/teams/:teamId
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<String>,
) -> ApiResult<Value> {
    entity::get(&state, &user, &TEAM, "teamId", &team_id).await
}

/// PATCH /v1/teams/:teamId
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateTeamBody>,
) -> ApiResult<Value> {
    entity::update(&state, &user, &TEAM, "teamId", &team_id, to_record(&body)?).await
}

/// DELETE /v1/teams/:teamId
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<String>,
) -> ApiResult<()> {
    entity::delete(&state, &user, &TEAM, "teamId", &team_id).await
}
