use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Video entity - an uploaded clip. Titles are unique across all users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub filename: String,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}

impl Video {
    pub fn new(
        user_id: Uuid,
        title: String,
        description: Option<String>,
        filename: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            description,
            filename,
            views: 0,
            created_at: Utc::now(),
        }
    }
}
