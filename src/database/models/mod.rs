pub mod author;
pub mod edition;
pub mod profile;
pub mod user_work;
pub mod work;

pub use author::{Author, AuthorRef, FollowedAuthor};
pub use edition::Edition;
pub use profile::Profile;
pub use user_work::{UserWork, UserWorkItem};
pub use work::{Work, WorkWithPrimaryEdition};

use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, Row};

use crate::types::{Page, PageRequest};

/// Row of a paginated query selecting `COUNT(*) OVER() AS total_count`
#[derive(Debug)]
pub struct Counted<T> {
    pub item: T,
    pub total_count: i64,
}

impl<'r, T> FromRow<'r, PgRow> for Counted<T>
where
    T: FromRow<'r, PgRow>,
{
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            item: T::from_row(row)?,
            total_count: row.try_get("total_count")?,
        })
    }
}

/// Assemble a page; an empty result reports a total of 0
pub fn into_page<T: Serialize>(rows: Vec<Counted<T>>, request: PageRequest) -> Page<T> {
    let total = rows.first().map(|row| row.total_count).unwrap_or(0);
    let items = rows.into_iter().map(|row| row.item).collect();
    Page::new(items, total, request)
}
