//! One store query per method, run on the caller's scoped connection.
//!
//! Services never decide HTTP statuses. They return `Ok(None)`, `Ok(false)` or empty pages when
//! a query finds nothing, and [`ServiceError`] when it fails.

pub mod account;
pub mod author;
pub mod edition;
pub mod error;
pub mod profile;
pub mod user_work;
pub mod work;

pub use account::AccountService;
pub use author::{AuthorService, ImportedAuthor};
pub use edition::{sort_editions, EditionService, ImportedEdition, NewEdition};
pub use error::{ConstraintViolation, ServiceError};
pub use profile::ProfileService;
pub use user_work::{UserWorkFilter, UserWorkService, UserWorkUpdate};
pub use work::{ImportedWork, WorkService};
