use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{JournalStore, StoreError};
use crate::models::journal_entry::{JournalEntry, JournalEntryRow, NewJournalEntry};
use crate::models::profile::UserProfile;

#[derive(Clone)]
pub struct PgJournalStore {
    db: PgPool,
}

impl PgJournalStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.db).await
    }
}

#[async_trait]
impl JournalStore for PgJournalStore {
    async fn insert_entry(
        &self,
        user_id: Uuid,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry, StoreError> {
        let row = sqlx::query_as::<_, JournalEntryRow>(
            r#"
            INSERT INTO journal_entries (id, user_id, recorded_at, mood, pain_level, entry_text, analysis)
            VALUES ($1, $2, NOW(), $3, $4, $5, $6)
            RETURNING id, user_id, recorded_at, mood, pain_level, entry_text, analysis
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(entry.mood)
        .bind(entry.pain_level)
        .bind(&entry.entry_text)
        .bind(entry.analysis.map(sqlx::types::Json))
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn entries_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        // LIMIT NULL is LIMIT ALL
        let rows = sqlx::query_as::<_, JournalEntryRow>(
            r#"
            SELECT id, user_id, recorded_at, mood, pain_level, entry_text, analysis
            FROM journal_entries
            WHERE user_id = $1 AND recorded_at >= $2 AND recorded_at < $3
            ORDER BY recorded_at DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn latest_entry(&self, user_id: Uuid) -> Result<Option<JournalEntry>, StoreError> {
        let row = sqlx::query_as::<_, JournalEntryRow>(
            r#"
            SELECT id, user_id, recorded_at, mood, pain_level, entry_text, analysis
            FROM journal_entries
            WHERE user_id = $1
            ORDER BY recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn all_entries(&self, user_id: Uuid) -> Result<Vec<JournalEntry>, StoreError> {
        let rows = sqlx::query_as::<_, JournalEntryRow>(
            r#"
            SELECT id, user_id, recorded_at, mood, pain_level, entry_text, analysis
            FROM journal_entries
            WHERE user_id = $1
            ORDER BY recorded_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn profile(&self, user_id: Uuid) -> Result<UserProfile, StoreError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT user_id, last_prompt_date, prompt_history FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(profile.unwrap_or_else(|| UserProfile::empty(user_id)))
    }

    async fn set_last_prompt_date(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, last_prompt_date)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET
                last_prompt_date = EXCLUDED.last_prompt_date,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn push_prompt_history(
        &self,
        user_id: Uuid,
        prompt: &str,
        keep: usize,
    ) -> Result<(), StoreError> {
        let keep = i32::try_from(keep).unwrap_or(i32::MAX).max(1);

        // Appended array has n + 1 items; keep the last $3 of them.
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, prompt_history)
            VALUES ($1, ARRAY[$2::text])
            ON CONFLICT (user_id) DO UPDATE SET
                prompt_history = (user_profiles.prompt_history || $2::text)[
                    GREATEST(cardinality(user_profiles.prompt_history) + 2 - $3, 1):
                ],
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(prompt)
        .bind(keep)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await?;
        Ok(())
    }
}
