use sqlx::PgConnection;
use uuid::Uuid;

use super::error::{like_pattern, query_failed, ServiceError};
use crate::database::models::{into_page, Author, Counted, FollowedAuthor};
use crate::types::{Page, PageRequest};

/// Author data pulled from Open Library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedAuthor {
    pub openlibrary_id: String,
    pub name: String,
}

pub struct AuthorService;

impl AuthorService {
    pub async fn get(conn: &mut PgConnection, author_id: Uuid) -> Result<Option<Author>, ServiceError> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(author_id)
            .fetch_optional(conn)
            .await
            .map_err(query_failed("Failed to load author"))
    }

    /// Authors the user follows, optionally filtered by name, newest follows first
    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: Uuid,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<FollowedAuthor>, ServiceError> {
        let rows = sqlx::query_as::<_, Counted<FollowedAuthor>>(
            r#"
            SELECT a.*, ua.created_at AS followed_at, COUNT(*) OVER() AS total_count
            FROM user_authors ua
            JOIN authors a ON a.id = ua.author_id
            WHERE ua.user_id = $1
              AND ($2::text IS NULL OR a.name ILIKE $2)
            ORDER BY ua.created_at DESC, a.name ASC, a.id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(search.map(like_pattern))
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(conn)
        .await
        .map_err(query_failed("Failed to list authors"))?;

        Ok(into_page(rows, page))
    }

    /// Insert a manual author owned by `user_id`
    pub async fn create_manual(conn: &mut PgConnection, user_id: Uuid, name: &str) -> Result<Author, ServiceError> {
        sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name, manual, owner_user_id) VALUES ($1, true, $2) RETURNING *",
        )
        .bind(name)
        .bind(user_id)
        .fetch_one(conn)
        .await
        .map_err(query_failed("Failed to create author"))
    }

    /// Delete a manual author the user owns; `false` when there was nothing to delete
    pub async fn delete_manual(conn: &mut PgConnection, user_id: Uuid, author_id: Uuid) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1 AND manual AND owner_user_id = $2")
            .bind(author_id)
            .bind(user_id)
            .execute(conn)
            .await
            .map_err(query_failed("Failed to delete author"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_followed(conn: &mut PgConnection, user_id: Uuid, author_id: Uuid) -> Result<bool, ServiceError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_authors WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(conn)
        .await
        .map_err(query_failed("Failed to check followed author"))
    }

    /// Follow an author; `false` when already followed
    pub async fn attach(conn: &mut PgConnection, user_id: Uuid, author_id: Uuid) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            "INSERT INTO user_authors (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(author_id)
        .execute(conn)
        .await
        .map_err(query_failed("Failed to follow author"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Unfollow an author; `false` when not followed
    pub async fn detach(conn: &mut PgConnection, user_id: Uuid, author_id: Uuid) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM user_authors WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(conn)
            .await
            .map_err(query_failed("Failed to unfollow author"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert or refresh a catalog author; the flag is `true` when the row is new
    pub async fn upsert_imported(
        conn: &mut PgConnection,
        author: &ImportedAuthor,
    ) -> Result<(Author, bool), ServiceError> {
        #[derive(sqlx::FromRow)]
        struct Upserted {
            #[sqlx(flatten)]
            author: Author,
            inserted: bool,
        }

        // xmax is 0 only for rows this statement inserted
        let row = sqlx::query_as::<_, Upserted>(
            r#"
            INSERT INTO authors (name, openlibrary_id, manual)
            VALUES ($1, $2, false)
            ON CONFLICT (openlibrary_id) DO UPDATE
                SET name = EXCLUDED.name, updated_at = now()
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(&author.name)
        .bind(&author.openlibrary_id)
        .fetch_one(conn)
        .await
        .map_err(query_failed("Failed to import author"))?;

        Ok((row.author, row.inserted))
    }
}
