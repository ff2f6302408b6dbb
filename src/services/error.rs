use thiserror::Error;

use crate::database::DatabaseError;

/// Store constraint failures callers can act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    #[error("An edition with this ISBN already exists")]
    DuplicateIsbn,

    #[error("This record already exists")]
    Duplicate,

    #[error("Manual entries must belong to you and cannot have an Open Library ID")]
    ManualOwnership,

    #[error("You do not have permission to modify this record")]
    PermissionDenied,

    #[error("A referenced record does not exist")]
    MissingReference,

    #[error("You have reached your limit for this list")]
    LimitReached,
}

impl ConstraintViolation {
    /// Classify a Postgres error by SQLSTATE, constraint name and message
    pub fn from_code(code: &str, constraint: Option<&str>, message: &str) -> Option<Self> {
        match code {
            "23505" if constraint.is_some_and(|name| name.contains("isbn")) => Some(Self::DuplicateIsbn),
            "23505" => Some(Self::Duplicate),
            "23514" => Some(Self::ManualOwnership),
            "42501" => Some(Self::PermissionDenied),
            "23503" => Some(Self::MissingReference),
            // raise_exception from the counter triggers
            "P0001" if message.to_ascii_lowercase().contains("limit") => Some(Self::LimitReached),
            _ => None,
        }
    }

    pub fn from_sqlx(err: &sqlx::Error) -> Option<Self> {
        let db_err = err.as_database_error()?;
        let code = db_err.code()?;
        Self::from_code(&code, db_err.constraint(), db_err.message())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}: {source}")]
    Query {
        message: &'static str,
        source: sqlx::Error,
    },

    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    pub fn constraint(&self) -> Option<ConstraintViolation> {
        match self {
            ServiceError::Constraint(violation) => Some(*violation),
            _ => None,
        }
    }
}

/// `map_err` adapter: constraint violations keep their name, anything else carries `message`
pub(crate) fn query_failed(message: &'static str) -> impl FnOnce(sqlx::Error) -> ServiceError {
    move |source| match ConstraintViolation::from_sqlx(&source) {
        Some(violation) => ServiceError::Constraint(violation),
        None => ServiceError::Query { message, source },
    }
}

/// `%term%` for ILIKE with the term's wildcards escaped
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
