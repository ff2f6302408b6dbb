use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub openlibrary_id: Option<String>,
    pub manual: bool,
    pub owner_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author followed by a user, with the time they started following
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FollowedAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub author: Author,
    pub followed_at: DateTime<Utc>,
}

/// Minimal author reference embedded in work listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub name: String,
}
