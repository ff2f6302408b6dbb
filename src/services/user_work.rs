use sqlx::PgConnection;
use uuid::Uuid;

use super::error::{like_pattern, query_failed, ServiceError};
use crate::database::models::{into_page, Counted, UserWork, UserWorkItem};
use crate::types::{Page, PageRequest, ReadingStatus, WorkSort};
use crate::validation::user_works::UserWorkChanges;

/// Filters for the reading list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserWorkFilter {
    /// Empty matches every status
    pub statuses: Vec<ReadingStatus>,
    /// `Some(None)` matches works whose availability is unknown
    pub available: Option<Option<bool>>,
    pub search: Option<String>,
    pub author_id: Option<Uuid>,
}

/// Changes applied by single and bulk updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserWorkUpdate {
    pub status: Option<ReadingStatus>,
    /// `Some(None)` resets availability to unknown
    pub available_in_legimi: Option<Option<bool>>,
}

impl From<UserWorkChanges> for UserWorkUpdate {
    fn from(changes: UserWorkChanges) -> Self {
        Self {
            status: changes.status,
            available_in_legimi: changes.available_in_legimi,
        }
    }
}

const UPDATE_SET: &str = r#"
    status = COALESCE($3::user_work_status_enum, status),
    status_updated_at = CASE
        WHEN $3::user_work_status_enum IS NOT NULL AND $3::user_work_status_enum <> status THEN now()
        ELSE status_updated_at
    END,
    available_in_legimi = CASE WHEN $4 THEN $5 ELSE available_in_legimi END,
    updated_at = now()
"#;

pub struct UserWorkService;

impl UserWorkService {
    pub async fn list(
        conn: &mut PgConnection,
        user_id: Uuid,
        filter: &UserWorkFilter,
        sort: WorkSort,
        page: PageRequest,
    ) -> Result<Page<UserWorkItem>, ServiceError> {
        let sql = format!(
            r#"
            SELECT uw.*,
                   to_jsonb(w) AS work,
                   to_jsonb(e) AS primary_edition,
                   COALESCE((
                       SELECT jsonb_agg(jsonb_build_object('id', a.id, 'name', a.name) ORDER BY a.name)
                       FROM author_works aw
                       JOIN authors a ON a.id = aw.author_id
                       WHERE aw.work_id = w.id
                   ), '[]'::jsonb) AS authors,
                   COUNT(*) OVER() AS total_count
            FROM user_works uw
            JOIN works w ON w.id = uw.work_id
            LEFT JOIN editions e ON e.id = w.primary_edition_id
            WHERE uw.user_id = $1
              AND (cardinality($2::text[]) = 0 OR uw.status::text = ANY($2::text[]))
              AND (NOT $3 OR uw.available_in_legimi IS NOT DISTINCT FROM $4)
              AND ($5::text IS NULL OR w.title ILIKE $5)
              AND ($6::uuid IS NULL OR EXISTS (
                  SELECT 1 FROM author_works aw WHERE aw.work_id = w.id AND aw.author_id = $6
              ))
            ORDER BY {}
            LIMIT $7 OFFSET $8
            "#,
            sort.order_by()
        );

        let statuses: Vec<&str> = filter.statuses.iter().map(ReadingStatus::as_str).collect();
        let rows = sqlx::query_as::<_, Counted<UserWorkItem>>(&sql)
            .bind(user_id)
            .bind(statuses)
            .bind(filter.available.is_some())
            .bind(filter.available.flatten())
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(filter.author_id)
            .bind(i64::from(page.limit))
            .bind(page.offset())
            .fetch_all(conn)
            .await
            .map_err(query_failed("Failed to list user works"))?;

        Ok(into_page(rows, page))
    }

    /// How many of `work_ids` are not on the user's list yet
    pub async fn count_new(conn: &mut PgConnection, user_id: Uuid, work_ids: &[Uuid]) -> Result<usize, ServiceError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT count(*) FROM unnest($2::uuid[]) AS candidate(work_id)
            WHERE NOT EXISTS (
                SELECT 1 FROM user_works uw WHERE uw.user_id = $1 AND uw.work_id = candidate.work_id
            )
            "#,
        )
        .bind(user_id)
        .bind(work_ids)
        .fetch_one(conn)
        .await
        .map_err(query_failed("Failed to check reading list"))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Add works to the reading list, skipping ones already on it; returns the added IDs
    pub async fn bulk_add(
        conn: &mut PgConnection,
        user_id: Uuid,
        work_ids: &[Uuid],
        status: ReadingStatus,
    ) -> Result<Vec<Uuid>, ServiceError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO user_works (user_id, work_id, status, status_updated_at)
            SELECT $1, work_id, $3, now() FROM unnest($2::uuid[]) AS work_id
            ON CONFLICT (user_id, work_id) DO NOTHING
            RETURNING work_id
            "#,
        )
        .bind(user_id)
        .bind(work_ids)
        .bind(status)
        .fetch_all(conn)
        .await
        .map_err(query_failed("Failed to add works"))
    }

    /// `None` when the work is not on the user's list
    pub async fn update(
        conn: &mut PgConnection,
        user_id: Uuid,
        work_id: Uuid,
        changes: UserWorkUpdate,
    ) -> Result<Option<UserWork>, ServiceError> {
        let sql = format!("UPDATE user_works SET {UPDATE_SET} WHERE user_id = $1 AND work_id = $2 RETURNING *");
        sqlx::query_as::<_, UserWork>(&sql)
            .bind(user_id)
            .bind(work_id)
            .bind(changes.status)
            .bind(changes.available_in_legimi.is_some())
            .bind(changes.available_in_legimi.flatten())
            .fetch_optional(conn)
            .await
            .map_err(query_failed("Failed to update user work"))
    }

    /// Apply the same changes to several works; returns how many rows changed
    pub async fn bulk_update(
        conn: &mut PgConnection,
        user_id: Uuid,
        work_ids: &[Uuid],
        changes: UserWorkUpdate,
    ) -> Result<u64, ServiceError> {
        let sql = format!("UPDATE user_works SET {UPDATE_SET} WHERE user_id = $1 AND work_id = ANY($2)");
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(work_ids)
            .bind(changes.status)
            .bind(changes.available_in_legimi.is_some())
            .bind(changes.available_in_legimi.flatten())
            .execute(conn)
            .await
            .map_err(query_failed("Failed to update user works"))?;
        Ok(result.rows_affected())
    }

    /// `false` when the work was not on the list
    pub async fn delete(conn: &mut PgConnection, user_id: Uuid, work_id: Uuid) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM user_works WHERE user_id = $1 AND work_id = $2")
            .bind(user_id)
            .bind(work_id)
            .execute(conn)
            .await
            .map_err(query_failed("Failed to remove work"))?;
        Ok(result.rows_affected() > 0)
    }
}
