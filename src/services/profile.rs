use sqlx::PgConnection;
use uuid::Uuid;

use super::error::{query_failed, ServiceError};
use crate::database::models::Profile;

pub struct ProfileService;

impl ProfileService {
    /// The caller's profile; `None` when the store has no row (or RLS hides it)
    pub async fn get(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<Profile>, ServiceError> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(conn)
            .await
            .map_err(query_failed("Failed to load profile"))
    }
}
