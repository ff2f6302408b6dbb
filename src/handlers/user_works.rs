use axum::extract::{Path, RawQuery, State};
use serde_json::{json, Value};
use tracing::info;

use crate::database::models::{UserWork, UserWorkItem};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, Session};
use crate::services::{ProfileService, UserWorkFilter, UserWorkService};
use crate::state::AppState;
use crate::types::Page;
use crate::validation::user_works::{
    BulkAddWorksCommand, BulkUpdateUserWorksCommand, UpdateUserWorkCommand, UserWorksQuery,
};
use crate::validation::{query, Schema, WorkIdParam};

/// GET /api/user/works - reading list with status, availability, title and author filters
pub async fn list_user_works(
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw): RawQuery,
) -> ApiResult<Page<UserWorkItem>> {
    let params = UserWorksQuery::parse(&query::to_value(raw.as_deref()))?;
    let user = session.require()?;

    let filter = UserWorkFilter {
        statuses: params.statuses,
        available: params.available,
        search: params.search,
        author_id: params.author_id,
    };
    let mut tx = state.db.scoped(session.role()).await?;
    let page = UserWorkService::list(&mut tx, user.id, &filter, params.sort, params.page).await?;

    Ok(ApiResponse::success(page))
}

/// POST /api/user/works/bulk - add works to the reading list
pub async fn bulk_add_works(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let command = BulkAddWorksCommand::parse(&body)?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    let profile = ProfileService::get(&mut tx, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    let additional = UserWorkService::count_new(&mut tx, user.id, &command.work_ids).await?;
    if !profile.can_add_works(additional) {
        return Err(ApiError::conflict(format!(
            "Work limit reached ({} of {})",
            profile.work_count, profile.max_works
        )));
    }

    let added = UserWorkService::bulk_add(&mut tx, user.id, &command.work_ids, command.status).await?;
    tx.commit().await?;

    info!("User {} added {} works as {}", user.id, added.len(), command.status);
    Ok(ApiResponse::created(json!({ "added": added })))
}

/// PATCH /api/user/works/bulk
pub async fn bulk_update_works(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let command = BulkUpdateUserWorksCommand::parse(&body)?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    let updated = UserWorkService::bulk_update(&mut tx, user.id, &command.work_ids, command.changes.into()).await?;
    tx.commit().await?;

    info!("User {} updated {} works", user.id, updated);
    Ok(ApiResponse::success(json!({ "updated": updated })))
}

/// PATCH /api/user/works/{workId} - change status and/or Legimi availability
pub async fn update_user_work(
    State(state): State<AppState>,
    session: Session,
    Path(work_id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<UserWork> {
    let WorkIdParam(work_id) = WorkIdParam::parse(&work_id)?;
    let command = UpdateUserWorkCommand::parse(&body)?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    let user_work = UserWorkService::update(&mut tx, user.id, work_id, command.changes.into())
        .await?
        .ok_or_else(|| ApiError::not_found("Work is not on your list"))?;
    tx.commit().await?;

    Ok(ApiResponse::success(user_work))
}

/// DELETE /api/user/works/{workId}
pub async fn delete_user_work(
    State(state): State<AppState>,
    session: Session,
    Path(work_id): Path<String>,
) -> ApiResult<()> {
    let WorkIdParam(work_id) = WorkIdParam::parse(&work_id)?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    if UserWorkService::delete(&mut tx, user.id, work_id).await? {
        info!("User {} removed work {}", user.id, work_id);
    }
    tx.commit().await?;

    Ok(ApiResponse::no_content())
}
