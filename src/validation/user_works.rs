use serde_json::Value;
use uuid::Uuid;

use crate::types::{PageRequest, ReadingStatus, WorkSort};

use super::rules::{self, RuleError, TextRule};
use super::{incomplete, page_request, Fields, Schema, ValidationErrors};

const SEARCH: TextRule = TextRule::new("Search", 200);
const STATUS_MESSAGE: &str = "Status must be one of: to_read, in_progress, read, hidden";
const UPDATE_REQUIRED: &str = "Provide status or available_in_legimi";

/// GET /api/user/works
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWorksQuery {
    /// Empty means every status
    pub statuses: Vec<ReadingStatus>,
    /// `None`: no filter, `Some(None)`: availability unknown, `Some(Some(b))`: exact match
    pub available: Option<Option<bool>>,
    pub search: Option<String>,
    pub author_id: Option<Uuid>,
    pub sort: WorkSort,
    pub page: PageRequest,
}

impl Schema for UserWorksQuery {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let statuses = fields.check("status", statuses(fields.get("status")));
        let available = fields.check(
            "available",
            rules::bool_like(fields.get("available"), "Available"),
        );
        let search = fields.check("search", rules::search_term(fields.get("search"), SEARCH));
        let author_id = fields.check(
            "author_id",
            rules::optional_uuid(fields.get("author_id"), "Invalid author ID format"),
        );
        let sort = fields.check(
            "sort",
            rules::optional_enumeration::<WorkSort>(
                fields.get("sort"),
                "Sort must be one of: published_desc, title_asc",
            ),
        );
        let page = page_request(&mut fields, 20, 100);
        fields.finish()?;

        let (Some(statuses), Some(available), Some(search), Some(author_id), Some(sort), Some(page)) =
            (statuses, available, search, author_id, sort, page)
        else {
            return Err(incomplete());
        };
        Ok(Self {
            statuses,
            available,
            search,
            author_id,
            sort: sort.unwrap_or_default(),
            page,
        })
    }
}

/// Single status or repeated `status=` keys
fn statuses(value: Option<&Value>) -> Result<Vec<ReadingStatus>, RuleError> {
    let items = rules::one_or_many(value);
    let many = items.len() > 1;
    let mut parsed = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match rules::enumeration::<ReadingStatus>(Some(item), STATUS_MESSAGE) {
            Ok(status) => parsed.push(status),
            Err(err) if many => return Err(RuleError::at(index.to_string(), err.message)),
            Err(err) => return Err(err),
        }
    }
    Ok(rules::dedupe(parsed))
}

/// POST /api/user/works/bulk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkAddWorksCommand {
    pub work_ids: Vec<Uuid>,
    pub status: ReadingStatus,
}

impl Schema for BulkAddWorksCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let work_ids = fields.check("work_ids", rules::bulk_ids(fields.get("work_ids"), "work IDs"));
        let status = fields.check(
            "status",
            rules::optional_enumeration::<ReadingStatus>(fields.get("status"), STATUS_MESSAGE),
        );
        fields.finish()?;

        let (Some(work_ids), Some(status)) = (work_ids, status) else {
            return Err(incomplete());
        };
        Ok(Self {
            work_ids,
            status: status.unwrap_or_default(),
        })
    }
}

/// Changes applied to one user work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserWorkChanges {
    pub status: Option<ReadingStatus>,
    /// `Some(None)` clears availability back to unknown
    pub available_in_legimi: Option<Option<bool>>,
}

fn read_changes(fields: &mut Fields<'_>) -> Option<UserWorkChanges> {
    let status = fields.check(
        "status",
        rules::optional_enumeration::<ReadingStatus>(fields.get("status"), STATUS_MESSAGE),
    );
    let available = fields.check(
        "available_in_legimi",
        rules::bool_like(fields.get("available_in_legimi"), "Available in Legimi"),
    );

    // Only refine once both fields parsed, so a bad value is not also reported as missing
    if let (Some(None), Some(None)) = (status, available) {
        fields.refine(&["status", "available_in_legimi"], UPDATE_REQUIRED);
        return None;
    }

    Some(UserWorkChanges {
        status: status?,
        available_in_legimi: available?,
    })
}

/// PATCH /api/user/works/{workId}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateUserWorkCommand {
    pub changes: UserWorkChanges,
}

impl Schema for UpdateUserWorkCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let changes = read_changes(&mut fields);
        fields.finish()?;

        let Some(changes) = changes else {
            return Err(incomplete());
        };
        Ok(Self { changes })
    }
}

/// PATCH /api/user/works/bulk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkUpdateUserWorksCommand {
    pub work_ids: Vec<Uuid>,
    pub changes: UserWorkChanges,
}

impl Schema for BulkUpdateUserWorksCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let work_ids = fields.check("work_ids", rules::bulk_ids(fields.get("work_ids"), "work IDs"));
        let changes = read_changes(&mut fields);
        fields.finish()?;

        let (Some(work_ids), Some(changes)) = (work_ids, changes) else {
            return Err(incomplete());
        };
        Ok(Self { work_ids, changes })
    }
}
