//! Field-level rules shared by the endpoint schemas.
//!
//! Each rule takes the raw field value (`None` when the key is absent) and returns the typed
//! value or a [`RuleError`].

use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashSet;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

/// Upper bound for bulk identifier lists
pub const MAX_BULK_IDS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleError {
    /// Path below the field being checked (array index, nested key)
    pub path: Vec<String>,
    pub message: String,
}

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    pub fn at(segment: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: vec![segment.into()],
            message: message.into(),
        }
    }
}

impl From<String> for RuleError {
    fn from(message: String) -> Self {
        RuleError::new(message)
    }
}

impl From<&str> for RuleError {
    fn from(message: &str) -> Self {
        RuleError::new(message)
    }
}

/// Length bounds and label for a trimmed text field
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    pub label: &'static str,
    pub min: usize,
    pub max: usize,
}

impl TextRule {
    pub const fn new(label: &'static str, max: usize) -> Self {
        Self { label, min: 1, max }
    }

    pub const fn with_min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }
}

/// Integer bounds and label for a numeric field
#[derive(Debug, Clone, Copy)]
pub struct IntRule {
    pub label: &'static str,
    pub min: i64,
    pub max: i64,
}

impl IntRule {
    pub const fn new(label: &'static str, min: i64, max: i64) -> Self {
        Self { label, min, max }
    }
}

fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Required string, trimmed before the emptiness and length checks
pub fn text(value: Option<&Value>, rule: TextRule) -> Result<String, RuleError> {
    let raw = match value {
        None | Some(Value::Null) => return Err(format!("{} is required", rule.label).into()),
        Some(Value::String(s)) => s,
        Some(_) => return Err(format!("{} must be a string", rule.label).into()),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", rule.label).into());
    }
    let length = trimmed.chars().count();
    if length < rule.min {
        return Err(format!("{} must be at least {} characters", rule.label, rule.min).into());
    }
    if length > rule.max {
        return Err(format!("{} must be at most {} characters", rule.label, rule.max).into());
    }
    Ok(trimmed.to_string())
}

/// Optional string; absent or null yields `None`, anything present must satisfy [`text`]
pub fn optional_text(value: Option<&Value>, rule: TextRule) -> Result<Option<String>, RuleError> {
    if is_absent(value) {
        return Ok(None);
    }
    text(value, rule).map(Some)
}

/// Free-text search term; an empty (after trim) term means "no search"
pub fn search_term(value: Option<&Value>, rule: TextRule) -> Result<Option<String>, RuleError> {
    match value {
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        _ => optional_text(value, rule),
    }
}

/// Password: not trimmed, only length-checked
pub fn password(value: Option<&Value>, min: usize, max: usize) -> Result<String, RuleError> {
    match value {
        Some(Value::String(s)) if s.is_empty() => Err("Password is required".into()),
        Some(Value::String(s)) if s.chars().count() < min => {
            Err(format!("Password must be at least {} characters", min).into())
        }
        Some(Value::String(s)) if s.chars().count() > max => {
            Err(format!("Password must be at most {} characters", max).into())
        }
        Some(Value::String(s)) => Ok(s.clone()),
        None | Some(Value::Null) => Err("Password is required".into()),
        Some(_) => Err("Password must be a string".into()),
    }
}

/// Email address, trimmed and lower-cased
pub fn email(value: Option<&Value>) -> Result<String, RuleError> {
    let address = text(value, TextRule::new("Email", 255))?;
    if !looks_like_email(&address) {
        return Err("Invalid email address".into());
    }
    Ok(address.to_lowercase())
}

fn looks_like_email(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// UUID in canonical hyphenated form
pub fn uuid(value: Option<&Value>, message: &str) -> Result<Uuid, RuleError> {
    match value {
        Some(Value::String(s)) => parse_uuid(s.trim()).ok_or_else(|| RuleError::new(message)),
        _ => Err(RuleError::new(message)),
    }
}

pub fn optional_uuid(value: Option<&Value>, message: &str) -> Result<Option<Uuid>, RuleError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        _ => uuid(value, message).map(Some),
    }
}

/// Accepts only the 36-character hyphenated form, not braced or simple forms
pub fn parse_uuid(raw: &str) -> Option<Uuid> {
    if raw.len() != 36 {
        return None;
    }
    Uuid::parse_str(raw).ok()
}

/// Integer that may arrive as a JSON number or as a query-string
///
/// The empty string counts as absent; any other non-numeric string fails.
pub fn integer(value: Option<&Value>, rule: IntRule) -> Result<Option<i64>, RuleError> {
    let number = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| RuleError::new(format!("{} must be a number", rule.label)))?,
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| RuleError::new(format!("{} must be a number", rule.label)))?,
        Some(_) => return Err(format!("{} must be a number", rule.label).into()),
    };

    if !number.is_finite() {
        return Err(format!("{} must be a number", rule.label).into());
    }
    if number.fract() != 0.0 {
        return Err(format!("{} must be an integer", rule.label).into());
    }
    if number < rule.min as f64 {
        return Err(format!("{} must be at least {}", rule.label, rule.min).into());
    }
    if number > rule.max as f64 {
        return Err(format!("{} must be at most {}", rule.label, rule.max).into());
    }
    Ok(Some(number as i64))
}

/// Boolean-like value: native bool/null, or `"true"`/`"false"`/`"null"` in any case
///
/// Outer `None` means absent, `Some(None)` means an explicit null.
pub fn bool_like(value: Option<&Value>, label: &str) -> Result<Option<Option<bool>>, RuleError> {
    match value {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::Bool(b)) => Ok(Some(Some(*b))),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(Some(true))),
            "false" => Ok(Some(Some(false))),
            "null" => Ok(Some(None)),
            _ => Err(format!("{} must be true, false or null", label).into()),
        },
        Some(_) => Err(format!("{} must be true, false or null", label).into()),
    }
}

/// Literal `true`, used for the `manual` flag of user-created entries
pub fn literal_true(value: Option<&Value>, message: &str) -> Result<(), RuleError> {
    match value {
        Some(Value::Bool(true)) => Ok(()),
        _ => Err(RuleError::new(message)),
    }
}

/// Field that must be absent or null (manual entries carry no external identifier)
pub fn absent_or_null(value: Option<&Value>, message: &str) -> Result<(), RuleError> {
    if is_absent(value) {
        Ok(())
    } else {
        Err(RuleError::new(message))
    }
}

/// Enum parsed from a string value
pub fn enumeration<T: FromStr>(value: Option<&Value>, message: &str) -> Result<T, RuleError> {
    match value {
        Some(Value::String(s)) => s.trim().parse().map_err(|_| RuleError::new(message)),
        _ => Err(RuleError::new(message)),
    }
}

pub fn optional_enumeration<T: FromStr>(value: Option<&Value>, message: &str) -> Result<Option<T>, RuleError> {
    if is_absent(value) {
        return Ok(None);
    }
    enumeration(value, message).map(Some)
}

/// Single value or array of values, as produced by repeated query keys
pub fn one_or_many(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    }
}

/// Remove duplicates, keeping the first occurrence of each value in place
pub fn dedupe<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Bulk identifier array: every entry a UUID, deduplicated, then 1..=100 entries
pub fn bulk_ids(value: Option<&Value>, label: &str) -> Result<Vec<Uuid>, RuleError> {
    let items = match value {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Err(format!("{} are required", label).into()),
        Some(_) => return Err(format!("{} must be an array", label).into()),
    };

    let mut ids = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::String(s) => match parse_uuid(s.trim()) {
                Some(id) => ids.push(id),
                None => return Err(RuleError::at(index.to_string(), "Invalid ID format")),
            },
            _ => return Err(RuleError::at(index.to_string(), "Invalid ID format")),
        }
    }

    let ids = dedupe(ids);
    check_bulk_size(ids.len(), label)?;
    Ok(ids)
}

pub fn check_bulk_size(len: usize, label: &str) -> Result<(), RuleError> {
    if len < 1 {
        return Err(format!("At least one of {} is required", label).into());
    }
    if len > MAX_BULK_IDS {
        return Err(format!("At most {} {} are allowed", MAX_BULK_IDS, label).into());
    }
    Ok(())
}

/// ISBN-13: exactly 13 digits, no separators
pub fn isbn13(value: Option<&Value>) -> Result<Option<String>, RuleError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => {
            let isbn = s.trim();
            if isbn.len() == 13 && isbn.bytes().all(|b| b.is_ascii_digit()) {
                Ok(Some(isbn.to_string()))
            } else {
                Err("ISBN-13 must be exactly 13 digits".into())
            }
        }
        Some(_) => Err("ISBN-13 must be exactly 13 digits".into()),
    }
}

/// Calendar date in ISO `YYYY-MM-DD` form
pub fn iso_date(value: Option<&Value>, label: &str) -> Result<Option<NaiveDate>, RuleError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| RuleError::new(format!("{} must be a date in YYYY-MM-DD format", label))),
        Some(_) => Err(format!("{} must be a date in YYYY-MM-DD format", label).into()),
    }
}
