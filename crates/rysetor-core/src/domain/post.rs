use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a short status update. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(user_id: Uuid, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            body,
            created_at: Utc::now(),
        }
    }
}
