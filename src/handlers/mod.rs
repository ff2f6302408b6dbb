// handlers/mod.rs - one module per resource
//
// Handlers validate input first, then check the session, then open a scoped transaction.
// Routes live in `crate::app`.

pub mod auth;
pub mod authors;
pub mod health;
pub mod openlibrary;
pub mod user;
pub mod user_works;
pub mod works;
