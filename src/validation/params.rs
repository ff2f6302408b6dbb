use uuid::Uuid;

use super::rules::parse_uuid;
use super::ValidationErrors;

/// Parse a UUID path segment, reporting `message` under `field` on failure
pub fn parse_uuid_param(raw: &str, field: &str, message: &str) -> Result<Uuid, ValidationErrors> {
    parse_uuid(raw.trim()).ok_or_else(|| ValidationErrors::single(&[field], message))
}

/// `{workId}` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkIdParam(pub Uuid);

impl WorkIdParam {
    pub fn parse(raw: &str) -> Result<Self, ValidationErrors> {
        parse_uuid_param(raw, "workId", "Invalid work ID format").map(Self)
    }
}

/// `{authorId}` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorIdParam(pub Uuid);

impl AuthorIdParam {
    pub fn parse(raw: &str) -> Result<Self, ValidationErrors> {
        parse_uuid_param(raw, "authorId", "Invalid author ID format").map(Self)
    }
}
