use axum::extract::{Path, RawQuery, State};
use tracing::info;

use crate::database::models::{Author, WorkWithPrimaryEdition};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, Session};
use crate::services::{AuthorService, WorkService};
use crate::state::AppState;
use crate::types::Page;
use crate::validation::authors::{AuthorWorksQuery, CreateAuthorCommand};
use crate::validation::{query, AuthorIdParam, Schema};

/// POST /api/authors - manual author owned by the caller
pub async fn create_author(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody,
) -> ApiResult<Author> {
    let command = CreateAuthorCommand::parse(&body)?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    let author = AuthorService::create_manual(&mut tx, user.id, &command.name).await?;
    tx.commit().await?;

    info!("User {} created manual author {}", user.id, author.id);
    Ok(ApiResponse::created(author))
}

/// GET /api/authors/{authorId}
pub async fn get_author(
    State(state): State<AppState>,
    session: Session,
    Path(author_id): Path<String>,
) -> ApiResult<Author> {
    let AuthorIdParam(author_id) = AuthorIdParam::parse(&author_id)?;

    let mut tx = state.db.scoped(session.role()).await?;
    let author = AuthorService::get(&mut tx, author_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Author not found"))?;

    Ok(ApiResponse::success(author))
}

/// DELETE /api/authors/{authorId} - only manual authors the caller owns
pub async fn delete_author(
    State(state): State<AppState>,
    session: Session,
    Path(author_id): Path<String>,
) -> ApiResult<()> {
    let AuthorIdParam(author_id) = AuthorIdParam::parse(&author_id)?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    if !AuthorService::delete_manual(&mut tx, user.id, author_id).await? {
        return Err(ApiError::not_found("Author not found"));
    }
    tx.commit().await?;

    info!("User {} deleted manual author {}", user.id, author_id);
    Ok(ApiResponse::no_content())
}

/// GET /api/authors/{authorId}/works
pub async fn list_author_works(
    State(state): State<AppState>,
    session: Session,
    Path(author_id): Path<String>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Page<WorkWithPrimaryEdition>> {
    let AuthorIdParam(author_id) = AuthorIdParam::parse(&author_id)?;
    let params = AuthorWorksQuery::parse(&query::to_value(raw.as_deref()))?;

    let mut tx = state.db.scoped(session.role()).await?;
    if AuthorService::get(&mut tx, author_id).await?.is_none() {
        return Err(ApiError::not_found("Author not found"));
    }
    let page = WorkService::list_by_author(&mut tx, author_id, params.sort, params.page).await?;

    Ok(ApiResponse::success(page))
}
