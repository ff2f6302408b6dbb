//! Open Library catalog access for author search and imports.

pub mod client;
pub mod parse;

pub use client::OpenLibraryClient;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::services::{ImportedAuthor, ImportedEdition, ImportedWork};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Open Library request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Open Library returned status {0}")]
    Status(u16),

    #[error("Unexpected Open Library response: {0}")]
    Decode(String),
}

/// One hit of an author search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSearchResult {
    pub openlibrary_id: String,
    pub name: String,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub top_work: Option<String>,
    pub work_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogAuthor {
    pub openlibrary_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogWork {
    pub openlibrary_id: String,
    pub title: String,
    pub first_publish_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEdition {
    pub openlibrary_id: String,
    pub title: Option<String>,
    pub isbn13: Option<String>,
    pub publish_year: Option<i32>,
    pub publish_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub cover_url: Option<String>,
    /// Short IDs of the works this edition belongs to
    pub work_ids: Vec<String>,
}

impl From<CatalogAuthor> for ImportedAuthor {
    fn from(author: CatalogAuthor) -> Self {
        Self {
            openlibrary_id: author.openlibrary_id,
            name: author.name,
        }
    }
}

impl From<CatalogWork> for ImportedWork {
    fn from(work: CatalogWork) -> Self {
        Self {
            openlibrary_id: work.openlibrary_id,
            title: work.title,
            first_publish_year: work.first_publish_year,
        }
    }
}

impl CatalogEdition {
    /// Editions without a title of their own take the work's title
    pub fn into_imported(self, fallback_title: &str) -> ImportedEdition {
        ImportedEdition {
            openlibrary_id: self.openlibrary_id,
            title: self.title.unwrap_or_else(|| fallback_title.to_string()),
            isbn13: self.isbn13,
            publish_year: self.publish_year,
            publish_date: self.publish_date,
            language: self.language,
            cover_url: self.cover_url,
        }
    }
}

/// Read access to the Open Library catalog; lookups return `None` for unknown IDs
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search_authors(&self, query: &str, limit: u32) -> Result<Vec<AuthorSearchResult>, CatalogError>;

    async fn author(&self, openlibrary_id: &str) -> Result<Option<CatalogAuthor>, CatalogError>;

    async fn work(&self, openlibrary_id: &str) -> Result<Option<CatalogWork>, CatalogError>;

    async fn work_editions(&self, openlibrary_id: &str, limit: u32) -> Result<Vec<CatalogEdition>, CatalogError>;

    async fn edition(&self, openlibrary_id: &str) -> Result<Option<CatalogEdition>, CatalogError>;
}

/// Edition to make primary after an import: the newest with an ISBN, else the newest overall
pub fn pick_primary_edition<'a, T>(
    editions: &'a [T],
    year: impl Fn(&T) -> Option<i32>,
    has_isbn: impl Fn(&T) -> bool,
) -> Option<&'a T> {
    let newest = |candidates: Vec<&'a T>| {
        candidates
            .into_iter()
            .enumerate()
            // Unknown years sort lowest; the earliest entry wins among equal years
            .max_by_key(|&(index, edition)| (year(edition), std::cmp::Reverse(index)))
            .map(|(_, edition)| edition)
    };
    newest(editions.iter().filter(|&edition| has_isbn(edition)).collect())
        .or_else(|| newest(editions.iter().collect()))
}
