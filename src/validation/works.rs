use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use uuid::Uuid;

use super::rules::{self, IntRule, TextRule};
use super::{incomplete, Fields, Schema, ValidationErrors};

const TITLE: TextRule = TextRule::new("Title", 500);
const PUBLISH_YEAR: IntRule = IntRule::new("Publish year", 1, 2100);
const FIRST_PUBLISH_YEAR: IntRule = IntRule::new("First publish year", 1, 2100);

/// POST /api/works - manual work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWorkCommand {
    pub title: String,
    pub author_ids: Vec<Uuid>,
    pub first_publish_year: Option<i32>,
}

impl Schema for CreateWorkCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let title = fields.check("title", rules::text(fields.get("title"), TITLE));
        let author_ids = fields.check("author_ids", rules::bulk_ids(fields.get("author_ids"), "author IDs"));
        let year = fields.check(
            "first_publish_year",
            rules::integer(fields.get("first_publish_year"), FIRST_PUBLISH_YEAR),
        );
        fields.check(
            "manual",
            rules::literal_true(fields.get("manual"), "Manual works must set manual to true"),
        );
        fields.check(
            "openlibrary_id",
            rules::absent_or_null(fields.get("openlibrary_id"), "Manual works cannot have an Open Library ID"),
        );
        fields.finish()?;

        let (Some(title), Some(author_ids), Some(year)) = (title, author_ids, year) else {
            return Err(incomplete());
        };
        Ok(Self {
            title,
            author_ids,
            first_publish_year: year.map(|y| y as i32),
        })
    }
}

/// POST /api/works/{workId}/editions - manual edition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEditionCommand {
    pub title: String,
    pub isbn13: Option<String>,
    pub publish_year: Option<i32>,
    pub publish_date: Option<NaiveDate>,
}

impl Schema for CreateEditionCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let title = fields.check("title", rules::text(fields.get("title"), TITLE));
        let isbn13 = fields.check("isbn13", rules::isbn13(fields.get("isbn13")));
        let year = fields.check("publish_year", rules::integer(fields.get("publish_year"), PUBLISH_YEAR));
        let date = fields.check("publish_date", rules::iso_date(fields.get("publish_date"), "Publish date"));
        fields.check(
            "manual",
            rules::literal_true(fields.get("manual"), "Manual editions must set manual to true"),
        );
        fields.check(
            "openlibrary_id",
            rules::absent_or_null(
                fields.get("openlibrary_id"),
                "Manual editions cannot have an Open Library ID",
            ),
        );

        // A full date and an explicit year must agree
        if let (Some(Some(year)), Some(Some(date))) = (year, date) {
            if i64::from(date.year()) != year {
                fields.refine(&["publish_year", "publish_date"], "Publish year must match the publish date");
            }
        }
        fields.finish()?;

        let (Some(title), Some(isbn13), Some(year), Some(date)) = (title, isbn13, year, date) else {
            return Err(incomplete());
        };
        Ok(Self {
            title,
            isbn13,
            publish_year: year.map(|y| y as i32).or_else(|| date.map(|d| d.year())),
            publish_date: date,
        })
    }
}

/// PATCH /api/works/{workId}/primary-edition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPrimaryEditionCommand {
    pub edition_id: Uuid,
}

impl Schema for SetPrimaryEditionCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let edition_id = fields.check(
            "edition_id",
            rules::uuid(fields.get("edition_id"), "Invalid edition ID format"),
        );
        fields.finish()?;

        let Some(edition_id) = edition_id else {
            return Err(incomplete());
        };
        Ok(Self { edition_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manual_work_needs_title_authors_and_flag() {
        let author = Uuid::new_v4();
        let cmd = CreateWorkCommand::parse(&json!({
            "title": "  The Dispossessed ",
            "author_ids": [author.to_string(), author.to_string()],
            "first_publish_year": 1974,
            "manual": true
        }))
        .unwrap();
        assert_eq!(cmd.title, "The Dispossessed");
        assert_eq!(cmd.author_ids, vec![author]);
        assert_eq!(cmd.first_publish_year, Some(1974));

        let err = CreateWorkCommand::parse(&json!({ "title": "X", "author_ids": [], "manual": true })).unwrap_err();
        assert_eq!(err.messages_for("author_ids"), vec!["At least one of author IDs is required"]);
    }

    #[test]
    fn manual_edition_checks_isbn_and_dates() {
        let cmd = CreateEditionCommand::parse(&json!({
            "title": "Dune",
            "isbn13": "9780441013593",
            "publish_date": "2005-08-02",
            "manual": true
        }))
        .unwrap();
        assert_eq!(cmd.publish_year, Some(2005));
        assert_eq!(cmd.isbn13.as_deref(), Some("9780441013593"));

        let err = CreateEditionCommand::parse(&json!({
            "title": "Dune",
            "isbn13": "12345",
            "manual": true
        }))
        .unwrap_err();
        assert_eq!(err.messages_for("isbn13"), vec!["ISBN-13 must be exactly 13 digits"]);
    }

    #[test]
    fn manual_edition_year_and_date_must_agree() {
        let err = CreateEditionCommand::parse(&json!({
            "title": "Dune",
            "publish_year": 1999,
            "publish_date": "2005-08-02",
            "manual": true
        }))
        .unwrap_err();
        assert_eq!(err.issues().len(), 2);
        assert_eq!(err.messages_for("publish_date"), vec!["Publish year must match the publish date"]);
    }
}
