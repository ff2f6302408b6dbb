pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openlibrary;
pub mod rate_limit;
pub mod services;
pub mod state;
pub mod types;
pub mod validation;

pub use app::build_router;
pub use state::AppState;
