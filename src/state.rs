use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthProvider, TokenVerifier};
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::openlibrary::Catalog;
use crate::rate_limit::RateLimiter;

/// Shared handles every handler receives through `State`
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseManager,
    pub auth: Arc<dyn AuthProvider>,
    pub catalog: Arc<dyn Catalog>,
    pub rate_limiter: Arc<RateLimiter>,
    pub verifier: TokenVerifier,
}

impl AppState {
    /// Count one request against the user's catalog quota, or reject it with 429
    ///
    /// The check and the record are separate steps, so two concurrent requests can both pass
    /// when only one slot is left.
    pub fn consume_rate_limit(&self, key: &str) -> Result<(), ApiError> {
        let limit = self.config.api.rate_limit_requests;
        let window = Duration::from_secs(self.config.api.rate_limit_window_secs);
        if self.rate_limiter.check(key, limit, window) {
            tracing::warn!("Rate limit reached for {}", key);
            return Err(ApiError::too_many_requests(
                "Too many requests, please wait a moment and try again",
            ));
        }
        self.rate_limiter.record(key);
        Ok(())
    }
}
