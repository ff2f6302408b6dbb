use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::auth::clear_session_cookies;
use crate::database::models::{FollowedAuthor, Profile};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, Session};
use crate::services::{AccountService, AuthorService, ProfileService};
use crate::state::AppState;
use crate::types::Page;
use crate::validation::authors::{AttachAuthorCommand, AuthorListQuery};
use crate::validation::{query, AuthorIdParam, Schema};

/// GET /api/user/profile
pub async fn profile(State(state): State<AppState>, session: Session) -> ApiResult<Profile> {
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    let profile = ProfileService::get(&mut tx, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(ApiResponse::success(profile))
}

/// DELETE /api/user/account - irreversible; the store cascades the user's rows
pub async fn delete_account(State(state): State<AppState>, session: Session) -> ApiResult<()> {
    let user = session.require()?;

    AccountService::delete(state.auth.as_ref(), user.id)
        .await
        .map_err(|e| {
            error!("Failed to delete account {}: {}", user.id, e);
            ApiError::internal_server_error("Failed to delete account")
        })?;

    Ok(ApiResponse::no_content().with_cookies(clear_session_cookies(state.config.security.secure_cookies)))
}

/// GET /api/user/authors - followed authors, paginated
pub async fn list_authors(
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw): RawQuery,
) -> ApiResult<Page<FollowedAuthor>> {
    let params = AuthorListQuery::parse(&query::to_value(raw.as_deref()))?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    let page = AuthorService::list_for_user(&mut tx, user.id, params.search.as_deref(), params.page).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/user/authors - follow an author
///
/// 201 when the author is newly followed, 200 when it already was.
pub async fn attach_author(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let command = AttachAuthorCommand::parse(&body)?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    let author = AuthorService::get(&mut tx, command.author_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Author not found"))?;

    // Re-following is a no-op, so only a new follow is held to the limit
    if !AuthorService::is_followed(&mut tx, user.id, author.id).await? {
        let profile = ProfileService::get(&mut tx, user.id)
            .await?
            .ok_or_else(|| ApiError::not_found("Profile not found"))?;
        if !profile.can_follow_author() {
            return Err(ApiError::conflict(format!(
                "Author limit reached ({} of {})",
                profile.author_count, profile.max_authors
            )));
        }
    }

    let attached = AuthorService::attach(&mut tx, user.id, author.id).await?;
    tx.commit().await?;

    if attached {
        info!("User {} followed author {}", user.id, author.id);
    }
    let status = if attached { StatusCode::CREATED } else { StatusCode::OK };
    Ok(ApiResponse::with_status(json!({ "author": author, "attached": attached }), status))
}

/// DELETE /api/user/authors/{authorId} - unfollow; succeeds even when not followed
pub async fn detach_author(
    State(state): State<AppState>,
    session: Session,
    Path(author_id): Path<String>,
) -> ApiResult<()> {
    let AuthorIdParam(author_id) = AuthorIdParam::parse(&author_id)?;
    let user = session.require()?;

    let mut tx = state.db.scoped(session.role()).await?;
    if AuthorService::detach(&mut tx, user.id, author_id).await? {
        info!("User {} unfollowed author {}", user.id, author_id);
    }
    tx.commit().await?;

    Ok(ApiResponse::no_content())
}
