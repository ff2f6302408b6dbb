use axum::extract::{Path, State};
use serde_json::{json, Value};
use tracing::info;

use crate::database::models::{Edition, Work, WorkWithPrimaryEdition};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, Session};
use crate::services::{EditionService, NewEdition, WorkService};
use crate::state::AppState;
use crate::validation::works::{CreateEditionCommand, CreateWorkCommand, SetPrimaryEditionCommand};
use crate::validation::{Schema, WorkIdParam};

/// POST /api/works - manual work linked to one or more authors
pub async fn create_work(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody,
) -> ApiResult<Work> {
    let command = CreateWorkCommand::parse(&body)?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    let work = WorkService::create_manual(
        &mut tx,
        user.id,
        &command.title,
        command.first_publish_year,
        &command.author_ids,
    )
    .await?;
    tx.commit().await?;

    info!("User {} created manual work {}", user.id, work.id);
    Ok(ApiResponse::created(work))
}

/// GET /api/works/{workId} - work with its primary edition
pub async fn get_work(
    State(state): State<AppState>,
    session: Session,
    Path(work_id): Path<String>,
) -> ApiResult<WorkWithPrimaryEdition> {
    let WorkIdParam(work_id) = WorkIdParam::parse(&work_id)?;

    let mut tx = state.db.scoped(session.role()).await?;
    let work = WorkService::get_with_primary(&mut tx, work_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Work not found"))?;

    Ok(ApiResponse::success(work))
}

/// GET /api/works/{workId}/editions - newest first, unknown years last
pub async fn list_editions(
    State(state): State<AppState>,
    session: Session,
    Path(work_id): Path<String>,
) -> ApiResult<Value> {
    let WorkIdParam(work_id) = WorkIdParam::parse(&work_id)?;

    let mut tx = state.db.scoped(session.role()).await?;
    if WorkService::get_with_primary(&mut tx, work_id).await?.is_none() {
        return Err(ApiError::not_found("Work not found"));
    }
    let editions = EditionService::list_by_work(&mut tx, work_id).await?;

    Ok(ApiResponse::success(json!({ "items": editions })))
}

/// POST /api/works/{workId}/editions - manual edition
pub async fn create_edition(
    State(state): State<AppState>,
    session: Session,
    Path(work_id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Edition> {
    let WorkIdParam(work_id) = WorkIdParam::parse(&work_id)?;
    let command = CreateEditionCommand::parse(&body)?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    if WorkService::get_with_primary(&mut tx, work_id).await?.is_none() {
        return Err(ApiError::not_found("Work not found"));
    }
    let edition = NewEdition {
        title: command.title,
        isbn13: command.isbn13,
        publish_year: command.publish_year,
        publish_date: command.publish_date,
    };
    let edition = EditionService::create_manual(&mut tx, user.id, work_id, &edition).await?;
    tx.commit().await?;

    info!("User {} added manual edition {} to work {}", user.id, edition.id, work_id);
    Ok(ApiResponse::created(edition))
}

/// PATCH /api/works/{workId}/primary-edition
pub async fn set_primary_edition(
    State(state): State<AppState>,
    session: Session,
    Path(work_id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<WorkWithPrimaryEdition> {
    let WorkIdParam(work_id) = WorkIdParam::parse(&work_id)?;
    let command = SetPrimaryEditionCommand::parse(&body)?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    if WorkService::get_with_primary(&mut tx, work_id).await?.is_none() {
        return Err(ApiError::not_found("Work not found"));
    }
    if WorkService::set_primary_edition(&mut tx, work_id, command.edition_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("Edition not found for this work"));
    }
    let work = WorkService::get_with_primary(&mut tx, work_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Work not found"))?;
    tx.commit().await?;

    info!("User {} set primary edition of work {} to {}", user.id, work_id, command.edition_id);
    Ok(ApiResponse::success(work))
}
