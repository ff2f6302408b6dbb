//! Request input contracts.
//!
//! Every endpoint parses its raw JSON body (or query string, converted to JSON by
//! [`query::to_value`]) through a typed schema before anything else happens. Schemas collect
//! every failing field instead of stopping at the first one; each failure carries the path of
//! the offending field.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::types::PageRequest;

pub mod auth;
pub mod authors;
pub mod openlibrary;
pub mod params;
pub mod query;
pub mod rules;
pub mod user_works;
pub mod works;

pub use params::{parse_uuid_param, AuthorIdParam, WorkIdParam};
pub use rules::RuleError;

/// A single failed check, addressed by field path (`["work_ids", "3"]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: Vec<String>,
    pub message: String,
}

/// Every issue found in one input
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn single(path: &[&str], message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(path, message);
        errors
    }

    pub fn push(&mut self, path: &[&str], message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.iter().map(|segment| segment.to_string()).collect(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    pub fn first_message(&self) -> &str {
        self.issues
            .first()
            .map(|issue| issue.message.as_str())
            .unwrap_or("Invalid input")
    }

    /// Messages reported for a top-level field
    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|issue| issue.path.first().map(String::as_str) == Some(field))
            .map(|issue| issue.message.as_str())
            .collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.first_message())
    }
}

impl std::error::Error for ValidationErrors {}

/// Field reader over a JSON object that accumulates issues as fields are checked
///
/// ```ignore
/// let mut fields = Fields::new(input);
/// let name = fields.check("name", rules::text(fields.get("name"), NAME));
/// fields.finish()?;
/// ```
pub struct Fields<'a> {
    object: Option<&'a Map<String, Value>>,
    errors: ValidationErrors,
}

impl<'a> Fields<'a> {
    pub fn new(input: &'a Value) -> Self {
        let mut errors = ValidationErrors::default();
        let object = match input {
            Value::Object(map) => Some(map),
            _ => {
                errors.push(&[], "Expected an object");
                None
            }
        };
        Self { object, errors }
    }

    /// Raw value of a field; `None` when absent
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.object.and_then(|map| map.get(key))
    }

    /// Record the outcome of a rule applied to `key`
    pub fn check<T>(&mut self, key: &str, result: Result<T, RuleError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                let mut path = vec![key.to_string()];
                path.extend(err.path);
                self.errors.issues.push(ValidationIssue {
                    path,
                    message: err.message,
                });
                None
            }
        }
    }

    /// Report one message against several fields at once (cross-field refinements)
    pub fn refine(&mut self, keys: &[&str], message: &str) {
        for key in keys {
            self.errors.push(&[key], message);
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Schema entry point implemented by every endpoint contract
pub trait Schema: Sized {
    fn parse(input: &Value) -> Result<Self, ValidationErrors>;
}

/// `page` (≥ 1, default 1) and `limit` (1..=max_limit) query parameters
pub(crate) fn page_request(fields: &mut Fields<'_>, default_limit: u32, max_limit: u32) -> Option<PageRequest> {
    let page = fields.check(
        "page",
        rules::integer(fields.get("page"), rules::IntRule::new("Page", 1, i64::from(u32::MAX))),
    );
    let limit = fields.check(
        "limit",
        rules::integer(fields.get("limit"), rules::IntRule::new("Limit", 1, i64::from(max_limit))),
    );
    let page = u32::try_from(page?.unwrap_or(1)).ok()?;
    let limit = u32::try_from(limit?.unwrap_or(i64::from(default_limit))).ok()?;
    Some(PageRequest::new(page, limit))
}

/// Fallback used after `finish()` when a checked field unexpectedly came back empty
pub(crate) fn incomplete() -> ValidationErrors {
    ValidationErrors::single(&[], "Invalid input")
}
