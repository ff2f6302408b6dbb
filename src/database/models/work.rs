use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use super::Edition;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Work {
    pub id: Uuid,
    pub title: String,
    pub openlibrary_id: Option<String>,
    pub first_publish_year: Option<i32>,
    pub primary_edition_id: Option<Uuid>,
    pub manual: bool,
    pub owner_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Work joined with its primary edition (`to_jsonb(e) AS primary_edition`)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkWithPrimaryEdition {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub work: Work,
    pub primary_edition: Option<Json<Edition>>,
}

impl WorkWithPrimaryEdition {
    pub fn primary_edition(&self) -> Option<&Edition> {
        self.primary_edition.as_ref().map(|edition| &edition.0)
    }
}
