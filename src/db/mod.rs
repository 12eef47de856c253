//! Persistence for journal entries and the per-user profile record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::journal_entry::{JournalEntry, NewJournalEntry};
use crate::models::profile::UserProfile;

pub mod memory;
pub mod pool;
pub mod postgres;

pub use memory::MemoryJournalStore;
pub use postgres::PgJournalStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("write rejected: {0}")]
    Rejected(String),

    /// The user already has an entry on that UTC day.
    #[error("duplicate daily entry: {0}")]
    Conflict(String),

    #[error("stored data could not be read: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            sqlx::Error::Database(db) => StoreError::Rejected(db.message().to_string()),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::TypeNotFound { .. } => StoreError::Corrupt(e.to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Append-only, per-user entry collection plus a mergeable profile record.
///
/// Every query is scoped to one user. Results that return several entries
/// are ordered newest first.
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Stores a new entry stamped with the store's own clock. A user has at
    /// most one entry per UTC day; a second one fails with
    /// [`StoreError::Conflict`] and nothing is written.
    async fn insert_entry(
        &self,
        user_id: Uuid,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry, StoreError>;

    /// Entries with `start <= date < end`.
    async fn entries_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<JournalEntry>, StoreError>;

    async fn latest_entry(&self, user_id: Uuid) -> Result<Option<JournalEntry>, StoreError>;

    async fn all_entries(&self, user_id: Uuid) -> Result<Vec<JournalEntry>, StoreError>;

    async fn profile(&self, user_id: Uuid) -> Result<UserProfile, StoreError>;

    /// Merge-upserts `last_prompt_date`, leaving other profile fields alone.
    async fn set_last_prompt_date(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Appends to the prompt history, keeping only the newest `keep` items.
    async fn push_prompt_history(
        &self,
        user_id: Uuid,
        prompt: &str,
        keep: usize,
    ) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
