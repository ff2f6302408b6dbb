use axum::extract::{RawQuery, State};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::database::models::{Author, Edition, WorkWithPrimaryEdition};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, Session};
use crate::openlibrary::pick_primary_edition;
use crate::services::{
    AuthorService, ConstraintViolation, EditionService, ImportedAuthor, ImportedWork, WorkService,
};
use crate::state::AppState;
use crate::validation::openlibrary::{
    AuthorSearchQuery, ImportAuthorCommand, ImportEditionCommand, ImportWorkCommand,
};
use crate::validation::{query, Schema};

/// GET /api/openlibrary/authors/search
pub async fn search_authors(
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw): RawQuery,
) -> ApiResult<Value> {
    let params = AuthorSearchQuery::parse(&query::to_value(raw.as_deref()))?;
    let user = session.require()?;
    state.consume_rate_limit(&user.id.to_string())?;

    let items = state.catalog.search_authors(&params.q, params.limit).await?;
    Ok(ApiResponse::success(json!({ "items": items })))
}

/// POST /api/openlibrary/import/author - 201 when new, 200 when already imported
pub async fn import_author(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody,
) -> ApiResult<Author> {
    let command = ImportAuthorCommand::parse(&body)?;
    let user = session.require()?;
    state.consume_rate_limit(&user.id.to_string())?;

    let author = state
        .catalog
        .author(&command.openlibrary_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Author not found in Open Library"))?;

    let mut tx = state.db.scoped(session.role()).await?;
    let (author, inserted) = AuthorService::upsert_imported(&mut tx, &ImportedAuthor::from(author)).await?;
    tx.commit().await?;

    if inserted {
        info!("User {} imported author {} ({})", user.id, author.id, command.openlibrary_id);
        Ok(ApiResponse::created(author))
    } else {
        Ok(ApiResponse::success(author))
    }
}

/// POST /api/openlibrary/import/work
///
/// Imports the work, links it to a local author and pulls its editions. An edition whose ISBN
/// already belongs to another edition is skipped. The newest edition with an ISBN becomes primary.
pub async fn import_work(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody,
) -> ApiResult<WorkWithPrimaryEdition> {
    let command = ImportWorkCommand::parse(&body)?;
    let user = session.require()?;
    state.consume_rate_limit(&user.id.to_string())?;

    // Catalog calls finish before a pooled connection is taken
    let work = state
        .catalog
        .work(&command.openlibrary_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Work not found in Open Library"))?;
    let editions = state
        .catalog
        .work_editions(&command.openlibrary_id, state.config.openlibrary.import_edition_limit)
        .await?;

    let mut tx = state.db.scoped(session.role()).await?;
    if AuthorService::get(&mut tx, command.author_id).await?.is_none() {
        return Err(ApiError::not_found("Author not found"));
    }

    let title = work.title.clone();
    let work = WorkService::upsert_imported(&mut tx, &ImportedWork::from(work)).await?;
    WorkService::link_author(&mut tx, work.id, command.author_id).await?;

    let mut imported: Vec<Edition> = Vec::with_capacity(editions.len());
    for edition in editions {
        let edition = edition.into_imported(&title);
        let mut savepoint = tx.savepoint().await?;
        match EditionService::upsert_imported(&mut savepoint, work.id, &edition).await {
            Ok(row) => {
                savepoint.commit().await.map_err(DatabaseError::from)?;
                imported.push(row);
            }
            Err(e) if e.constraint() == Some(ConstraintViolation::DuplicateIsbn) => {
                warn!(
                    "Skipping edition {} of work {}: ISBN {:?} already exists",
                    edition.openlibrary_id, work.id, edition.isbn13
                );
                savepoint.rollback().await.map_err(DatabaseError::from)?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(primary) = pick_primary_edition(&imported, |e| e.publish_year, |e| e.isbn13.is_some()) {
        WorkService::set_primary_edition(&mut tx, work.id, primary.id).await?;
    }

    let result = WorkService::get_with_primary(&mut tx, work.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Work not found"))?;
    tx.commit().await?;

    info!(
        "User {} imported work {} ({}) with {} editions, primary {:?}",
        user.id,
        work.id,
        command.openlibrary_id,
        imported.len(),
        result.primary_edition().map(|edition| edition.id)
    );
    Ok(ApiResponse::created(result))
}

/// POST /api/openlibrary/import/edition
pub async fn import_edition(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody,
) -> ApiResult<Edition> {
    let command = ImportEditionCommand::parse(&body)?;
    let user = session.require()?;
    state.consume_rate_limit(&user.id.to_string())?;

    let edition = state
        .catalog
        .edition(&command.openlibrary_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Edition not found in Open Library"))?;

    let mut tx = state.db.scoped(session.role()).await?;
    let work = WorkService::get_with_primary(&mut tx, command.work_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Work not found"))?;
    let edition = edition.into_imported(&work.work.title);
    let edition = EditionService::upsert_imported(&mut tx, command.work_id, &edition).await?;
    tx.commit().await?;

    info!("User {} imported edition {} into work {}", user.id, edition.id, command.work_id);
    Ok(ApiResponse::created(edition))
}
