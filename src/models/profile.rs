use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-user profile record. Only advisory fields live here; a user with no
/// row yet reads as [`UserProfile::empty`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub last_prompt_date: Option<DateTime<Utc>>,
    /// Oldest first.
    pub prompt_history: Vec<String>,
}

impl UserProfile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            last_prompt_date: None,
            prompt_history: Vec::new(),
        }
    }
}
