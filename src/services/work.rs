use sqlx::PgConnection;
use uuid::Uuid;

use super::error::{query_failed, ServiceError};
use crate::database::models::{into_page, Counted, Work, WorkWithPrimaryEdition};
use crate::types::{Page, PageRequest, WorkSort};

/// Work data pulled from Open Library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedWork {
    pub openlibrary_id: String,
    pub title: String,
    pub first_publish_year: Option<i32>,
}

/// Work columns plus its primary edition serialized as one JSON column
const WORK_WITH_PRIMARY: &str = "SELECT w.*, to_jsonb(e) AS primary_edition";

pub struct WorkService;

impl WorkService {
    pub async fn get_with_primary(
        conn: &mut PgConnection,
        work_id: Uuid,
    ) -> Result<Option<WorkWithPrimaryEdition>, ServiceError> {
        let sql = format!(
            "{WORK_WITH_PRIMARY} FROM works w LEFT JOIN editions e ON e.id = w.primary_edition_id WHERE w.id = $1"
        );
        sqlx::query_as::<_, WorkWithPrimaryEdition>(&sql)
            .bind(work_id)
            .fetch_optional(conn)
            .await
            .map_err(query_failed("Failed to load work"))
    }

    pub async fn list_by_author(
        conn: &mut PgConnection,
        author_id: Uuid,
        sort: WorkSort,
        page: PageRequest,
    ) -> Result<Page<WorkWithPrimaryEdition>, ServiceError> {
        let sql = format!(
            r#"
            {WORK_WITH_PRIMARY}, COUNT(*) OVER() AS total_count
            FROM author_works aw
            JOIN works w ON w.id = aw.work_id
            LEFT JOIN editions e ON e.id = w.primary_edition_id
            WHERE aw.author_id = $1
            ORDER BY {}
            LIMIT $2 OFFSET $3
            "#,
            sort.order_by()
        );
        let rows = sqlx::query_as::<_, Counted<WorkWithPrimaryEdition>>(&sql)
            .bind(author_id)
            .bind(i64::from(page.limit))
            .bind(page.offset())
            .fetch_all(conn)
            .await
            .map_err(query_failed("Failed to list author works"))?;

        Ok(into_page(rows, page))
    }

    /// Insert a manual work owned by `user_id` and link it to every author in one statement
    pub async fn create_manual(
        conn: &mut PgConnection,
        user_id: Uuid,
        title: &str,
        first_publish_year: Option<i32>,
        author_ids: &[Uuid],
    ) -> Result<Work, ServiceError> {
        sqlx::query_as::<_, Work>(
            r#"
            WITH created AS (
                INSERT INTO works (title, first_publish_year, manual, owner_user_id)
                VALUES ($1, $2, true, $3)
                RETURNING *
            ), linked AS (
                INSERT INTO author_works (author_id, work_id)
                SELECT author_id, created.id FROM created, unnest($4::uuid[]) AS author_id
            )
            SELECT * FROM created
            "#,
        )
        .bind(title)
        .bind(first_publish_year)
        .bind(user_id)
        .bind(author_ids)
        .fetch_one(conn)
        .await
        .map_err(query_failed("Failed to create work"))
    }

    /// Link a work to an author; linking twice is a no-op
    pub async fn link_author(conn: &mut PgConnection, work_id: Uuid, author_id: Uuid) -> Result<(), ServiceError> {
        sqlx::query("INSERT INTO author_works (author_id, work_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(author_id)
            .bind(work_id)
            .execute(conn)
            .await
            .map_err(query_failed("Failed to link author to work"))?;
        Ok(())
    }

    /// Point the work at one of its own editions; `None` when the edition is not part of the work
    pub async fn set_primary_edition(
        conn: &mut PgConnection,
        work_id: Uuid,
        edition_id: Uuid,
    ) -> Result<Option<Work>, ServiceError> {
        sqlx::query_as::<_, Work>(
            r#"
            UPDATE works w
            SET primary_edition_id = $2, updated_at = now()
            WHERE w.id = $1
              AND EXISTS (SELECT 1 FROM editions e WHERE e.id = $2 AND e.work_id = $1)
            RETURNING w.*
            "#,
        )
        .bind(work_id)
        .bind(edition_id)
        .fetch_optional(conn)
        .await
        .map_err(query_failed("Failed to set primary edition"))
    }

    /// Insert or refresh a catalog work, keyed by its Open Library ID
    pub async fn upsert_imported(conn: &mut PgConnection, work: &ImportedWork) -> Result<Work, ServiceError> {
        sqlx::query_as::<_, Work>(
            r#"
            INSERT INTO works (title, openlibrary_id, first_publish_year, manual)
            VALUES ($1, $2, $3, false)
            ON CONFLICT (openlibrary_id) DO UPDATE
                SET title = EXCLUDED.title,
                    first_publish_year = COALESCE(EXCLUDED.first_publish_year, works.first_publish_year),
                    updated_at = now()
            RETURNING *
            "#,
        )
        .bind(&work.title)
        .bind(&work.openlibrary_id)
        .bind(work.first_publish_year)
        .fetch_one(conn)
        .await
        .map_err(query_failed("Failed to import work"))
    }
}
