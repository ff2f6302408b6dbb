use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use super::{AuthorRef, Edition, Work};
use crate::types::ReadingStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserWork {
    pub user_id: Uuid,
    pub work_id: Uuid,
    pub status: ReadingStatus,
    /// `None` until someone checks Legimi
    pub available_in_legimi: Option<bool>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the user's reading list: the association plus the work it points at
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserWorkItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user_work: UserWork,
    pub work: Json<Work>,
    pub primary_edition: Option<Json<Edition>>,
    pub authors: Json<Vec<AuthorRef>>,
}
