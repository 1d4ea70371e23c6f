//! Shared bodies of the per-entity handlers: rights check, path id check,
//! service call, presentation.

use serde_json::Value;

use crate::api::format::{present, present_all};
use crate::auth::Right;
use crate::database::{EntityMeta, Page, QueryOptions, Record};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::validations::object_id;

pub const READ: &[Right] = &[Right::GetUsers];
pub const WRITE: &[Right] = &[Right::ManageUsers];

pub async fn create(state: &AppState, user: &AuthUser, meta: &'static EntityMeta, body: Record) -> ApiResult<Value> {
    user.require_rights(WRITE, None)?;
    let record = state.entities(meta).create(body).await?;
    Ok(ApiResponse::created(present(record, meta)))
}

pub async fn list(
    state: &AppState,
    user: &AuthUser,
    meta: &'static EntityMeta,
    filter: Value,
    options: QueryOptions,
) -> ApiResult<Page> {
    user.require_rights(READ, None)?;
    let page = state.entities(meta).query(filter, &options).await?;
    Ok(ApiResponse::success(page))
}

pub async fn search(state: &AppState, user: &AuthUser, meta: &'static EntityMeta, filter: Value) -> ApiResult<Vec<Value>> {
    user.require_rights(READ, None)?;
    let records = state.entities(meta).search(filter).await?;
    Ok(ApiResponse::success(present_all(records, meta)))
}

pub async fn get(state: &AppState, user: &AuthUser, meta: &'static EntityMeta, param: &str, id: &str) -> ApiResult<Value> {
    user.require_rights(READ, None)?;
    object_id(param, id)?;
    let record = state.entities(meta).get_by_id_or_404(id).await?;
    Ok(ApiResponse::success(present(record, meta)))
}

pub async fn update(
    state: &AppState,
    user: &AuthUser,
    meta: &'static EntityMeta,
    param: &str,
    id: &str,
    patch: Record,
) -> ApiResult<Value> {
    user.require_rights(WRITE, None)?;
    object_id(param, id)?;
    let record = state.entities(meta).update_by_id(id, patch).await?;
    Ok(ApiResponse::success(present(record, meta)))
}

pub async fn delete(state: &AppState, user: &AuthUser, meta: &'static EntityMeta, param: &str, id: &str) -> ApiResult<()> {
    user.require_rights(WRITE, None)?;
    object_id(param, id)?;
    state.entities(meta).delete_by_id(id).await?;
    Ok(ApiResponse::no_content())
}
