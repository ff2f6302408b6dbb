//! Normalization of Open Library JSON documents.
//!
//! Open Library fields are loosely typed: keys come as `/authors/OL1A` or `OL1A`, publish dates
//! are free text ("1965", "March 5, 2005", "c1990"), and identifiers come as lists.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

use super::{AuthorSearchResult, CatalogAuthor, CatalogEdition, CatalogWork, CatalogError};

const COVERS_URL: &str = "https://covers.openlibrary.org/b/id";

/// Full-date formats seen in `publish_date`
const DATE_FORMATS: [&str; 6] = ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%b. %d, %Y", "%Y/%m/%d"];

/// Last path segment of an Open Library key
pub fn short_key(key: &str) -> &str {
    key.trim_end_matches('/').rsplit('/').next().unwrap_or(key)
}

/// Year and, when the text is a full date, the date itself
pub fn parse_publish_date(raw: &str) -> (Option<i32>, Option<NaiveDate>) {
    let raw = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return (Some(date.year()), Some(date));
        }
    }
    (find_year(raw), None)
}

/// First standalone run of four digits within 1..=2100
fn find_year(raw: &str) -> Option<i32> {
    let bytes = raw.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if !bytes[start].is_ascii_digit() {
            start += 1;
            continue;
        }
        let end = bytes[start..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |offset| start + offset);
        if end - start == 4 {
            if let Ok(year) = raw[start..end].parse::<i32>() {
                if (1..=2100).contains(&year) {
                    return Some(year);
                }
            }
        }
        start = end;
    }
    None
}

/// Digits of an ISBN, dropping hyphens and spaces
fn isbn_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_ascii_uppercase()
}

/// ISBN-10 to ISBN-13 with the `978` prefix
pub fn isbn10_to_13(isbn10: &str) -> Option<String> {
    let digits = isbn_digits(isbn10);
    if digits.len() != 10 || !digits[..9].bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let body = format!("978{}", &digits[..9]);
    let sum: u32 = body
        .bytes()
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    let check = (10 - sum % 10) % 10;
    Some(format!("{body}{check}"))
}

/// First usable ISBN-13, converting an ISBN-10 when no ISBN-13 is listed
pub fn pick_isbn13(isbn_13: &[String], isbn_10: &[String]) -> Option<String> {
    isbn_13
        .iter()
        .map(|raw| isbn_digits(raw))
        .find(|digits| digits.len() == 13 && digits.bytes().all(|b| b.is_ascii_digit()))
        .or_else(|| isbn_10.iter().find_map(|raw| isbn10_to_13(raw)))
}

fn cover_url(covers: &[i64]) -> Option<String> {
    covers
        .iter()
        .find(|&&id| id > 0)
        .map(|id| format!("{COVERS_URL}/{id}-M.jpg"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, CatalogError> {
    serde_json::from_value(value).map_err(|e| CatalogError::Decode(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct KeyRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    key: String,
    name: Option<String>,
    birth_date: Option<String>,
    death_date: Option<String>,
    top_work: Option<String>,
    work_count: Option<i64>,
}

pub fn author_search(value: Value) -> Result<Vec<AuthorSearchResult>, CatalogError> {
    let response: SearchResponse = decode(value)?;
    Ok(response
        .docs
        .into_iter()
        .filter_map(|doc| {
            Some(AuthorSearchResult {
                openlibrary_id: short_key(&doc.key).to_string(),
                name: non_empty(doc.name)?,
                birth_date: non_empty(doc.birth_date),
                death_date: non_empty(doc.death_date),
                top_work: non_empty(doc.top_work),
                work_count: doc.work_count,
            })
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct AuthorDoc {
    key: String,
    name: Option<String>,
    personal_name: Option<String>,
}

pub fn author(value: Value) -> Result<CatalogAuthor, CatalogError> {
    let doc: AuthorDoc = decode(value)?;
    let name = non_empty(doc.name)
        .or_else(|| non_empty(doc.personal_name))
        .ok_or_else(|| CatalogError::Decode(format!("author {} has no name", doc.key)))?;
    Ok(CatalogAuthor {
        openlibrary_id: short_key(&doc.key).to_string(),
        name,
    })
}

#[derive(Debug, Deserialize)]
struct WorkDoc {
    key: String,
    title: Option<String>,
    first_publish_date: Option<String>,
}

pub fn work(value: Value) -> Result<CatalogWork, CatalogError> {
    let doc: WorkDoc = decode(value)?;
    let title = non_empty(doc.title).ok_or_else(|| CatalogError::Decode(format!("work {} has no title", doc.key)))?;
    Ok(CatalogWork {
        openlibrary_id: short_key(&doc.key).to_string(),
        title,
        first_publish_year: doc.first_publish_date.as_deref().and_then(|raw| parse_publish_date(raw).0),
    })
}

#[derive(Debug, Deserialize)]
struct EditionDoc {
    key: String,
    title: Option<String>,
    publish_date: Option<String>,
    #[serde(default)]
    isbn_13: Vec<String>,
    #[serde(default)]
    isbn_10: Vec<String>,
    #[serde(default)]
    languages: Vec<KeyRef>,
    #[serde(default)]
    covers: Vec<i64>,
    #[serde(default)]
    works: Vec<KeyRef>,
}

pub fn edition(value: Value) -> Result<CatalogEdition, CatalogError> {
    let doc: EditionDoc = decode(value)?;
    let (publish_year, publish_date) = doc
        .publish_date
        .as_deref()
        .map(parse_publish_date)
        .unwrap_or((None, None));
    Ok(CatalogEdition {
        openlibrary_id: short_key(&doc.key).to_string(),
        title: non_empty(doc.title),
        isbn13: pick_isbn13(&doc.isbn_13, &doc.isbn_10),
        publish_year,
        publish_date,
        language: doc.languages.first().map(|language| short_key(&language.key).to_string()),
        cover_url: cover_url(&doc.covers),
        work_ids: doc.works.iter().map(|work| short_key(&work.key).to_string()).collect(),
    })
}

#[derive(Debug, Deserialize)]
struct EditionsResponse {
    #[serde(default)]
    entries: Vec<Value>,
}

/// Editions listing of a work; entries that fail to parse are skipped
pub fn work_editions(value: Value) -> Result<Vec<CatalogEdition>, CatalogError> {
    let response: EditionsResponse = decode(value)?;
    Ok(response
        .entries
        .into_iter()
        .filter_map(|entry| match edition(entry) {
            Ok(edition) => Some(edition),
            Err(err) => {
                tracing::debug!("Skipping unreadable edition entry: {}", err);
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_shortened() {
        assert_eq!(short_key("/authors/OL23919A"), "OL23919A");
        assert_eq!(short_key("/books/OL7353617M/"), "OL7353617M");
        assert_eq!(short_key("OL45804W"), "OL45804W");
    }

    #[test]
    fn publish_dates_yield_year_and_optional_date() {
        assert_eq!(
            parse_publish_date("March 5, 2005"),
            (Some(2005), NaiveDate::from_ymd_opt(2005, 3, 5))
        );
        assert_eq!(
            parse_publish_date("1999-12-31"),
            (Some(1999), NaiveDate::from_ymd_opt(1999, 12, 31))
        );
        assert_eq!(parse_publish_date("1965"), (Some(1965), None));
        assert_eq!(parse_publish_date("c1990."), (Some(1990), None));
        assert_eq!(parse_publish_date("[19--]"), (None, None));
        assert_eq!(parse_publish_date("12345"), (None, None));
    }

    #[test]
    fn isbn10_converts_with_check_digit() {
        assert_eq!(isbn10_to_13("0-441-01359-7").as_deref(), Some("9780441013593"));
        assert_eq!(isbn10_to_13("123"), None);
        assert_eq!(
            pick_isbn13(&["978-0-441-01359-3".to_string()], &[]).as_deref(),
            Some("9780441013593")
        );
        assert_eq!(
            pick_isbn13(&["bad".to_string()], &["0441013597".to_string()]).as_deref(),
            Some("9780441013593")
        );
    }

    #[test]
    fn edition_document_is_normalized() {
        let edition = edition(json!({
            "key": "/books/OL7353617M",
            "title": "Dune",
            "publish_date": "August 2, 2005",
            "isbn_13": ["9780441013593"],
            "languages": [{ "key": "/languages/eng" }],
            "covers": [-1, 12345],
            "works": [{ "key": "/works/OL893415W" }]
        }))
        .unwrap();
        assert_eq!(edition.openlibrary_id, "OL7353617M");
        assert_eq!(edition.publish_year, Some(2005));
        assert_eq!(edition.language.as_deref(), Some("eng"));
        assert_eq!(
            edition.cover_url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/12345-M.jpg")
        );
        assert_eq!(edition.work_ids, vec!["OL893415W".to_string()]);
    }

    #[test]
    fn search_skips_nameless_docs() {
        let results = author_search(json!({
            "numFound": 2,
            "docs": [
                { "key": "OL23919A", "name": "J. K. Rowling", "work_count": 300 },
                { "key": "OL1A" }
            ]
        }))
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].openlibrary_id, "OL23919A");
        assert_eq!(results[0].work_count, Some(300));
    }

    #[test]
    fn work_without_title_is_a_decode_error() {
        assert!(matches!(work(json!({ "key": "/works/OL1W" })), Err(CatalogError::Decode(_))));
        let work = work(json!({ "key": "/works/OL1W", "title": "Dune", "first_publish_date": "1965" })).unwrap();
        assert_eq!(work.first_publish_year, Some(1965));
    }
}
