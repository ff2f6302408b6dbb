use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{parse, AuthorSearchResult, Catalog, CatalogAuthor, CatalogEdition, CatalogError, CatalogWork};
use crate::config::OpenLibraryConfig;

/// HTTP client for the public Open Library JSON API
pub struct OpenLibraryClient {
    http: Client,
    base_url: String,
}

impl OpenLibraryClient {
    pub fn new(config: &OpenLibraryConfig) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("bookflow-api/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a JSON document; `None` on 404
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Option<Value>, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Open Library GET {}", url);
        let response = self.http.get(&url).query(query).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(CatalogError::Status(status.as_u16())),
        }
    }
}

#[async_trait]
impl Catalog for OpenLibraryClient {
    async fn search_authors(&self, query: &str, limit: u32) -> Result<Vec<AuthorSearchResult>, CatalogError> {
        let params = [("q", query.to_string()), ("limit", limit.to_string())];
        match self.get_json("/search/authors.json", &params).await? {
            Some(body) => parse::author_search(body),
            None => Ok(Vec::new()),
        }
    }

    async fn author(&self, openlibrary_id: &str) -> Result<Option<CatalogAuthor>, CatalogError> {
        self.get_json(&format!("/authors/{openlibrary_id}.json"), &[])
            .await?
            .map(parse::author)
            .transpose()
    }

    async fn work(&self, openlibrary_id: &str) -> Result<Option<CatalogWork>, CatalogError> {
        self.get_json(&format!("/works/{openlibrary_id}.json"), &[])
            .await?
            .map(parse::work)
            .transpose()
    }

    async fn work_editions(&self, openlibrary_id: &str, limit: u32) -> Result<Vec<CatalogEdition>, CatalogError> {
        let params = [("limit", limit.to_string())];
        match self
            .get_json(&format!("/works/{openlibrary_id}/editions.json"), &params)
            .await?
        {
            Some(body) => parse::work_editions(body),
            None => Ok(Vec::new()),
        }
    }

    async fn edition(&self, openlibrary_id: &str) -> Result<Option<CatalogEdition>, CatalogError> {
        self.get_json(&format!("/books/{openlibrary_id}.json"), &[])
            .await?
            .map(parse::edition)
            .transpose()
    }
}
