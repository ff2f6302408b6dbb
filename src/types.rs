//! Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user's relationship to a work
/// Stored as the `user_work_status_enum` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_work_status_enum", rename_all = "snake_case")]
pub enum ReadingStatus {
    #[default]
    ToRead,
    InProgress,
    Read,
    Hidden,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 4] = [
        ReadingStatus::ToRead,
        ReadingStatus::InProgress,
        ReadingStatus::Read,
        ReadingStatus::Hidden,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::ToRead => "to_read",
            ReadingStatus::InProgress => "in_progress",
            ReadingStatus::Read => "read",
            ReadingStatus::Hidden => "hidden",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReadingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(())
    }
}

/// Ordering applied to work listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkSort {
    /// First publish year descending, unknown years last
    #[default]
    PublishedDesc,
    TitleAsc,
}

impl WorkSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkSort::PublishedDesc => "published_desc",
            WorkSort::TitleAsc => "title_asc",
        }
    }

    /// ORDER BY fragment for a query aliasing works as `w`
    pub fn order_by(&self) -> &'static str {
        match self {
            WorkSort::PublishedDesc => "w.first_publish_year DESC NULLS LAST, w.title ASC, w.id ASC",
            WorkSort::TitleAsc => "w.title ASC, w.id ASC",
        }
    }
}

impl FromStr for WorkSort {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published_desc" => Ok(WorkSort::PublishedDesc),
            "title_asc" => Ok(WorkSort::TitleAsc),
            _ => Err(()),
        }
    }
}

/// Page request resolved from `page` / `limit` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page: page.max(1), limit }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

/// Paginated listing returned by list endpoints
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
        }
    }
}
