use serde_json::Value;
use uuid::Uuid;

use crate::types::{PageRequest, WorkSort};

use super::rules::{self, TextRule};
use super::{incomplete, page_request, Fields, Schema, ValidationErrors};

pub const AUTHOR_NAME: TextRule = TextRule::new("Name", 500);
const SEARCH: TextRule = TextRule::new("Search", 200);

/// POST /api/authors - manual author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAuthorCommand {
    pub name: String,
}

impl Schema for CreateAuthorCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let name = fields.check("name", rules::text(fields.get("name"), AUTHOR_NAME));
        fields.check(
            "manual",
            rules::literal_true(fields.get("manual"), "Manual authors must set manual to true"),
        );
        fields.check(
            "openlibrary_id",
            rules::absent_or_null(
                fields.get("openlibrary_id"),
                "Manual authors cannot have an Open Library ID",
            ),
        );
        fields.finish()?;

        let Some(name) = name else {
            return Err(incomplete());
        };
        Ok(Self { name })
    }
}

/// POST /api/user/authors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachAuthorCommand {
    pub author_id: Uuid,
}

impl Schema for AttachAuthorCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let author_id = fields.check(
            "author_id",
            rules::uuid(fields.get("author_id"), "Invalid author ID format"),
        );
        fields.finish()?;

        let Some(author_id) = author_id else {
            return Err(incomplete());
        };
        Ok(Self { author_id })
    }
}

/// GET /api/user/authors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorListQuery {
    pub search: Option<String>,
    pub page: PageRequest,
}

impl Schema for AuthorListQuery {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let search = fields.check("search", rules::search_term(fields.get("search"), SEARCH));
        let page = page_request(&mut fields, 30, 100);
        fields.finish()?;

        let (Some(search), Some(page)) = (search, page) else {
            return Err(incomplete());
        };
        Ok(Self { search, page })
    }
}

/// GET /api/authors/{authorId}/works
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorWorksQuery {
    pub sort: WorkSort,
    pub page: PageRequest,
}

impl Schema for AuthorWorksQuery {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let sort = fields.check(
            "sort",
            rules::optional_enumeration::<WorkSort>(
                fields.get("sort"),
                "Sort must be one of: published_desc, title_asc",
            ),
        );
        let page = page_request(&mut fields, 30, 100);
        fields.finish()?;

        let (Some(sort), Some(page)) = (sort, page) else {
            return Err(incomplete());
        };
        Ok(Self {
            sort: sort.unwrap_or_default(),
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manual_author_with_null_external_id_passes() {
        let cmd = CreateAuthorCommand::parse(&json!({
            "name": "A",
            "manual": true,
            "openlibrary_id": null
        }))
        .unwrap();
        assert_eq!(cmd.name, "A");
    }

    #[test]
    fn manual_author_with_empty_name_fails() {
        let err = CreateAuthorCommand::parse(&json!({ "name": "", "manual": true })).unwrap_err();
        assert_eq!(err.first_message(), "Name cannot be empty");
        assert_eq!(err.issues().len(), 1);
    }

    #[test]
    fn manual_author_must_be_flagged_manual() {
        let err = CreateAuthorCommand::parse(&json!({ "name": "A", "manual": false })).unwrap_err();
        assert_eq!(err.messages_for("manual"), vec!["Manual authors must set manual to true"]);
    }

    #[test]
    fn manual_author_rejects_external_id() {
        let err = CreateAuthorCommand::parse(&json!({
            "name": "A",
            "manual": true,
            "openlibrary_id": "OL1A"
        }))
        .unwrap_err();
        assert_eq!(
            err.messages_for("openlibrary_id"),
            vec!["Manual authors cannot have an Open Library ID"]
        );
    }

    #[test]
    fn author_list_query_defaults() {
        let query = AuthorListQuery::parse(&json!({})).unwrap();
        assert_eq!(query.search, None);
        assert_eq!(query.page, PageRequest::new(1, 30));

        let query = AuthorListQuery::parse(&json!({ "search": "  ", "page": "", "limit": "5" })).unwrap();
        assert_eq!(query.search, None);
        assert_eq!(query.page, PageRequest::new(1, 5));
    }

    #[test]
    fn author_works_query_rejects_unknown_sort() {
        let err = AuthorWorksQuery::parse(&json!({ "sort": "random" })).unwrap_err();
        assert_eq!(err.issues()[0].path, vec!["sort".to_string()]);
        let query = AuthorWorksQuery::parse(&json!({ "sort": "title_asc", "page": "2" })).unwrap();
        assert_eq!(query.sort, WorkSort::TitleAsc);
        assert_eq!(query.page.page, 2);
    }
}
