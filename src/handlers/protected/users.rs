use axum::extract::{Path, State};
use axum::Extension;
use serde_json::Value;

use super::entity::{READ, WRITE};
use crate::api::format::{present, present_all};
use crate::database::models::USER;
use crate::database::Page;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson, ValidatedQuery};
use crate::services::UserSearch;
use crate::state::AppState;
use crate::validations::user::{CreateUserBody, ListUsersQuery, UpdateUserBody};
use crate::validations::{object_id, split_list_query, to_record};

const USER_ID: &str = "userId";

/// POST /v1/users
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<CreateUserBody>,
) -> ApiResult<Value> {
    user.require_rights(WRITE, None)?;
    let created = state.users().create_user(to_record(&body)?).await?;
    Ok(ApiResponse::created(present(created, &USER)))
}

/// GET /v1/users
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ListUsersQuery>,
) -> ApiResult<Page> {
    user.require_rights(READ, None)?;
    let (filter, options) = split_list_query(&query)?;
    Ok(ApiResponse::success(state.users().query_users(filter, &options).await?))
}

/// GET /v1/users/search
pub async fn search(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedQuery(search): ValidatedQuery<UserSearch>,
) -> ApiResult<Vec<Value>> {
    user.require_rights(READ, None)?;
    let users = state.users().search_users(&search).await?;
    Ok(ApiResponse::success(present_all(users, &USER)))
}

/// GET /v1/users/:userId
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> ApiResult<Value> {
    user.require_rights(READ, Some(&user_id))?;
    object_id(USER_ID, &user_id)?;
    let found = state
        .users()
        .get_user_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER.not_found()))?;
    Ok(ApiResponse::success(present(found, &USER)))
}

/// PATCH /v1/users/:userId
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateUserBody>,
) -> ApiResult<Value> {
    user.require_rights(WRITE, Some(&user_id))?;
    if body.touches_access() && !user.has_rights(WRITE) {
        return Err(ApiError::forbidden("Forbidden"));
    }
    object_id(USER_ID, &user_id)?;
    let updated = state.users().update_user_by_id(&user_id, to_record(&body)?).await?;
    Ok(ApiResponse::success(present(updated, &USER)))
}

/// DELETE /v1/users/:userId
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> ApiResult<()> {
    user.require_rights(WRITE, Some(&user_id))?;
    object_id(USER_ID, &user_id)?;
    state.users().delete_user_by_id(&user_id).await?;
    Ok(ApiResponse::no_content())
}
