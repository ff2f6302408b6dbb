use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Edition {
    pub id: Uuid,
    pub work_id: Uuid,
    pub title: String,
    pub openlibrary_id: Option<String>,
    pub isbn13: Option<String>,
    pub publish_year: Option<i32>,
    pub publish_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub cover_url: Option<String>,
    pub manual: bool,
    pub owner_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
