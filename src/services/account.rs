use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthError, AuthProvider};

pub struct AccountService;

impl AccountService {
    /// Delete the auth user; the store cascades every row that references it
    ///
    /// Irreversible. Goes through the platform's admin API, so it needs the service role key.
    pub async fn delete(auth: &dyn AuthProvider, user_id: Uuid) -> Result<(), AuthError> {
        auth.delete_user(user_id).await?;
        info!("Deleted account {}", user_id);
        Ok(())
    }
}
