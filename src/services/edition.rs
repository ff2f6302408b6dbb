use chrono::NaiveDate;
use sqlx::PgConnection;
use std::cmp::Reverse;
use uuid::Uuid;

use super::error::{query_failed, ServiceError};
use crate::database::models::Edition;

/// Fields of a manual edition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEdition {
    pub title: String,
    pub isbn13: Option<String>,
    pub publish_year: Option<i32>,
    pub publish_date: Option<NaiveDate>,
}

/// Edition data pulled from Open Library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedEdition {
    pub openlibrary_id: String,
    pub title: String,
    pub isbn13: Option<String>,
    pub publish_year: Option<i32>,
    pub publish_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub cover_url: Option<String>,
}

/// Newest first, unknown years last; ties keep their incoming order
pub fn sort_editions(editions: &mut [Edition]) {
    editions.sort_by_key(|edition| match edition.publish_year {
        Some(year) => (false, Reverse(year)),
        None => (true, Reverse(0)),
    });
}

pub struct EditionService;

impl EditionService {
    pub async fn list_by_work(conn: &mut PgConnection, work_id: Uuid) -> Result<Vec<Edition>, ServiceError> {
        let mut editions = sqlx::query_as::<_, Edition>(
            "SELECT * FROM editions WHERE work_id = $1 ORDER BY publish_year DESC NULLS LAST, created_at ASC",
        )
        .bind(work_id)
        .fetch_all(conn)
        .await
        .map_err(query_failed("Failed to list editions"))?;

        sort_editions(&mut editions);
        Ok(editions)
    }

    /// Insert a manual edition owned by `user_id`
    pub async fn create_manual(
        conn: &mut PgConnection,
        user_id: Uuid,
        work_id: Uuid,
        edition: &NewEdition,
    ) -> Result<Edition, ServiceError> {
        sqlx::query_as::<_, Edition>(
            r#"
            INSERT INTO editions (work_id, title, isbn13, publish_year, publish_date, manual, owner_user_id)
            VALUES ($1, $2, $3, $4, $5, true, $6)
            RETURNING *
            "#,
        )
        .bind(work_id)
        .bind(&edition.title)
        .bind(&edition.isbn13)
        .bind(edition.publish_year)
        .bind(edition.publish_date)
        .bind(user_id)
        .fetch_one(conn)
        .await
        .map_err(query_failed("Failed to create edition"))
    }

    /// Insert or refresh a catalog edition under `work_id`
    pub async fn upsert_imported(
        conn: &mut PgConnection,
        work_id: Uuid,
        edition: &ImportedEdition,
    ) -> Result<Edition, ServiceError> {
        sqlx::query_as::<_, Edition>(
            r#"
            INSERT INTO editions
                (work_id, title, openlibrary_id, isbn13, publish_year, publish_date, language, cover_url, manual)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false)
            ON CONFLICT (openlibrary_id) DO UPDATE
                SET title = EXCLUDED.title,
                    isbn13 = COALESCE(EXCLUDED.isbn13, editions.isbn13),
                    publish_year = COALESCE(EXCLUDED.publish_year, editions.publish_year),
                    publish_date = COALESCE(EXCLUDED.publish_date, editions.publish_date),
                    language = COALESCE(EXCLUDED.language, editions.language),
                    cover_url = COALESCE(EXCLUDED.cover_url, editions.cover_url),
                    updated_at = now()
            RETURNING *
            "#,
        )
        .bind(work_id)
        .bind(&edition.title)
        .bind(&edition.openlibrary_id)
        .bind(&edition.isbn13)
        .bind(edition.publish_year)
        .bind(edition.publish_date)
        .bind(&edition.language)
        .bind(&edition.cover_url)
        .fetch_one(conn)
        .await
        .map_err(query_failed("Failed to import edition"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn edition(title: &str, publish_year: Option<i32>) -> Edition {
        Edition {
            id: Uuid::new_v4(),
            work_id: Uuid::nil(),
            title: title.to_string(),
            openlibrary_id: None,
            isbn13: None,
            publish_year,
            publish_date: None,
            language: None,
            cover_url: None,
            manual: true,
            owner_user_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn years(editions: &[Edition]) -> Vec<Option<i32>> {
        editions.iter().map(|e| e.publish_year).collect()
    }

    #[test]
    fn editions_sort_newest_first_with_unknown_years_last() {
        let mut editions = vec![edition("a", Some(2001)), edition("b", Some(2010)), edition("c", None)];
        sort_editions(&mut editions);
        assert_eq!(years(&editions), vec![Some(2010), Some(2001), None]);
    }

    #[test]
    fn edition_sort_is_stable() {
        let mut editions = vec![
            edition("first", None),
            edition("x", Some(1999)),
            edition("second", None),
            edition("y", Some(1999)),
        ];
        sort_editions(&mut editions);
        let titles: Vec<_> = editions.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["x", "y", "first", "second"]);
    }
}
