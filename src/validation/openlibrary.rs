use serde_json::Value;
use uuid::Uuid;

use super::rules::{self, IntRule, RuleError, TextRule};
use super::{incomplete, Fields, Schema, ValidationErrors};

const QUERY: TextRule = TextRule::new("Search query", 200);
const SEARCH_LIMIT: IntRule = IntRule::new("Limit", 1, 50);

/// Long-form prefixes Open Library uses in its `key` fields
const LONG_FORM_PREFIXES: [&str; 3] = ["authors/", "works/", "books/"];

/// Kind of Open Library record, identified by the ID's trailing letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenLibraryKind {
    Author,
    Work,
    Edition,
}

impl OpenLibraryKind {
    fn suffix(&self) -> char {
        match self {
            OpenLibraryKind::Author => 'A',
            OpenLibraryKind::Work => 'W',
            OpenLibraryKind::Edition => 'M',
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            OpenLibraryKind::Author => "author",
            OpenLibraryKind::Work => "work",
            OpenLibraryKind::Edition => "edition",
        }
    }

    fn example(&self) -> &'static str {
        match self {
            OpenLibraryKind::Author => "OL23919A",
            OpenLibraryKind::Work => "OL45804W",
            OpenLibraryKind::Edition => "OL7353617M",
        }
    }
}

/// Short-form Open Library ID (`OL23919A`); long forms such as `/authors/OL23919A` are rejected
pub fn openlibrary_id(value: Option<&Value>, kind: OpenLibraryKind) -> Result<String, RuleError> {
    let raw = match value {
        Some(Value::String(s)) => s.trim(),
        None | Some(Value::Null) => return Err("Open Library ID is required".into()),
        Some(_) => return Err("Open Library ID must be a string".into()),
    };
    if raw.is_empty() {
        return Err("Open Library ID cannot be empty".into());
    }

    if raw.starts_with('/') || LONG_FORM_PREFIXES.iter().any(|prefix| raw.starts_with(prefix)) {
        return Err(format!(
            "Use the short Open Library {} ID (e.g. {}), not a path",
            kind.noun(),
            kind.example()
        )
        .into());
    }

    if is_short_form(raw, kind) {
        Ok(raw.to_string())
    } else {
        Err(format!("Invalid Open Library {} ID (expected e.g. {})", kind.noun(), kind.example()).into())
    }
}

fn is_short_form(raw: &str, kind: OpenLibraryKind) -> bool {
    let Some(rest) = raw.strip_prefix("OL") else {
        return false;
    };
    let Some(digits) = rest.strip_suffix(kind.suffix()) else {
        return false;
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// GET /api/openlibrary/authors/search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorSearchQuery {
    pub q: String,
    pub limit: u32,
}

impl Schema for AuthorSearchQuery {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let q = fields.check("q", rules::text(fields.get("q"), QUERY));
        let limit = fields.check("limit", rules::integer(fields.get("limit"), SEARCH_LIMIT));
        fields.finish()?;

        let (Some(q), Some(limit)) = (q, limit) else {
            return Err(incomplete());
        };
        Ok(Self {
            q,
            limit: limit.map(|l| l as u32).unwrap_or(10),
        })
    }
}

/// POST /api/openlibrary/import/author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAuthorCommand {
    pub openlibrary_id: String,
}

impl Schema for ImportAuthorCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let id = fields.check(
            "openlibrary_id",
            openlibrary_id(fields.get("openlibrary_id"), OpenLibraryKind::Author),
        );
        fields.finish()?;

        let Some(openlibrary_id) = id else {
            return Err(incomplete());
        };
        Ok(Self { openlibrary_id })
    }
}

/// POST /api/openlibrary/import/work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportWorkCommand {
    pub openlibrary_id: String,
    pub author_id: Uuid,
}

impl Schema for ImportWorkCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let id = fields.check(
            "openlibrary_id",
            openlibrary_id(fields.get("openlibrary_id"), OpenLibraryKind::Work),
        );
        let author_id = fields.check(
            "author_id",
            rules::uuid(fields.get("author_id"), "Invalid author ID format"),
        );
        fields.finish()?;

        let (Some(openlibrary_id), Some(author_id)) = (id, author_id) else {
            return Err(incomplete());
        };
        Ok(Self {
            openlibrary_id,
            author_id,
        })
    }
}

/// POST /api/openlibrary/import/edition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEditionCommand {
    pub openlibrary_id: String,
    pub work_id: Uuid,
}

impl Schema for ImportEditionCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let id = fields.check(
            "openlibrary_id",
            openlibrary_id(fields.get("openlibrary_id"), OpenLibraryKind::Edition),
        );
        let work_id = fields.check("work_id", rules::uuid(fields.get("work_id"), "Invalid work ID format"));
        fields.finish()?;

        let (Some(openlibrary_id), Some(work_id)) = (id, work_id) else {
            return Err(incomplete());
        };
        Ok(Self {
            openlibrary_id,
            work_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_form_ids_are_accepted() {
        let cmd = ImportAuthorCommand::parse(&json!({ "openlibrary_id": " OL23919A " })).unwrap();
        assert_eq!(cmd.openlibrary_id, "OL23919A");

        let work = Uuid::new_v4();
        let cmd = ImportEditionCommand::parse(&json!({
            "openlibrary_id": "OL7353617M",
            "work_id": work.to_string()
        }))
        .unwrap();
        assert_eq!(cmd.work_id, work);
    }

    #[test]
    fn long_form_ids_are_rejected() {
        for raw in ["/authors/OL23919A", "authors/OL23919A", "/OL23919A"] {
            let err = ImportAuthorCommand::parse(&json!({ "openlibrary_id": raw })).unwrap_err();
            assert_eq!(
                err.first_message(),
                "Use the short Open Library author ID (e.g. OL23919A), not a path",
                "{raw}"
            );
        }
        let err = ImportWorkCommand::parse(&json!({
            "openlibrary_id": "/works/OL45804W",
            "author_id": Uuid::new_v4().to_string()
        }))
        .unwrap_err();
        assert!(err.first_message().starts_with("Use the short Open Library work ID"));
    }

    #[test]
    fn ids_of_the_wrong_kind_are_rejected() {
        let err = ImportAuthorCommand::parse(&json!({ "openlibrary_id": "OL45804W" })).unwrap_err();
        assert_eq!(
            err.first_message(),
            "Invalid Open Library author ID (expected e.g. OL23919A)"
        );
        assert!(ImportAuthorCommand::parse(&json!({ "openlibrary_id": "OLA" })).is_err());
    }

    #[test]
    fn search_query_defaults_limit() {
        let query = AuthorSearchQuery::parse(&json!({ "q": "le guin" })).unwrap();
        assert_eq!(query.limit, 10);
        let err = AuthorSearchQuery::parse(&json!({ "q": " ", "limit": "51" })).unwrap_err();
        assert_eq!(err.messages_for("q"), vec!["Search query cannot be empty"]);
        assert_eq!(err.messages_for("limit"), vec!["Limit must be at most 50"]);
    }
}
