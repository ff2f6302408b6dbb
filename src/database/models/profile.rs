use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-user counters and limits, maintained by store triggers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub author_count: i32,
    pub work_count: i32,
    pub max_authors: i32,
    pub max_works: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn can_follow_author(&self) -> bool {
        self.author_count < self.max_authors
    }

    /// Whether `additional` more works fit under the limit
    pub fn can_add_works(&self, additional: usize) -> bool {
        i64::from(self.work_count) + additional as i64 <= i64::from(self.max_works)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(author_count: i32, work_count: i32) -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            author_count,
            work_count,
            max_authors: 2,
            max_works: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn limits_are_inclusive_of_the_maximum() {
        assert!(profile(1, 0).can_follow_author());
        assert!(!profile(2, 0).can_follow_author());
        assert!(profile(0, 3).can_add_works(2));
        assert!(!profile(0, 3).can_add_works(3));
    }
}
