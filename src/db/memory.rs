use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{JournalStore, StoreError};
use crate::models::journal_entry::{JournalEntry, NewJournalEntry};
use crate::models::profile::UserProfile;
use crate::services::dates::{is_same_day, EntryDate, ServerTimestamp};
use crate::services::prompts::append_to_history;

/// In-process store for local development and tests (single instance only).
///
/// Entries are stamped with a [`ServerTimestamp`], the same wrapper shape a
/// managed document store hands back.
#[derive(Clone, Default)]
pub struct MemoryJournalStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    entries: HashMap<Uuid, Vec<JournalEntry>>,
    profiles: HashMap<Uuid, UserProfile>,
}

impl MemoryJournalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry with a caller-chosen date, e.g. to seed history.
    pub async fn import_entry(&self, entry: JournalEntry) {
        let mut state = self.inner.lock().await;
        state.entries.entry(entry.user_id).or_default().push(entry);
    }
}

fn newest_first(mut entries: Vec<JournalEntry>) -> Vec<JournalEntry> {
    entries.sort_by_key(|e| std::cmp::Reverse(e.recorded_at()));
    entries
}

#[async_trait]
impl JournalStore for MemoryJournalStore {
    async fn insert_entry(
        &self,
        user_id: Uuid,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry, StoreError> {
        let stamp = ServerTimestamp::now();
        let stored = JournalEntry {
            id: Uuid::new_v4(),
            user_id,
            date: EntryDate::ServerTimestamp(stamp),
            mood: entry.mood,
            pain_level: entry.pain_level,
            entry_text: entry.entry_text,
            analysis: entry.analysis,
        };

        // Day check and push share one lock.
        let mut state = self.inner.lock().await;
        let entries = state.entries.entry(user_id).or_default();
        if entries.iter().any(|e| is_same_day(e.date, stamp)) {
            return Err(StoreError::Conflict(format!(
                "user {user_id} already has an entry today"
            )));
        }
        entries.push(stored.clone());
        Ok(stored)
    }

    async fn entries_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let state = self.inner.lock().await;
        let matching: Vec<JournalEntry> = state
            .entries
            .get(&user_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| {
                        let at = e.recorded_at();
                        at >= start && at < end
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mut sorted = newest_first(matching);
        if let Some(limit) = limit {
            sorted.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }
        Ok(sorted)
    }

    async fn latest_entry(&self, user_id: Uuid) -> Result<Option<JournalEntry>, StoreError> {
        let state = self.inner.lock().await;
        Ok(state
            .entries
            .get(&user_id)
            .and_then(|entries| entries.iter().max_by_key(|e| e.recorded_at()).cloned()))
    }

    async fn all_entries(&self, user_id: Uuid) -> Result<Vec<JournalEntry>, StoreError> {
        let state = self.inner.lock().await;
        let entries = state.entries.get(&user_id).cloned().unwrap_or_default();
        Ok(newest_first(entries))
    }

    async fn profile(&self, user_id: Uuid) -> Result<UserProfile, StoreError> {
        let state = self.inner.lock().await;
        Ok(state
            .profiles
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserProfile::empty(user_id)))
    }

    async fn set_last_prompt_date(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        state
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::empty(user_id))
            .last_prompt_date = Some(at);
        Ok(())
    }

    async fn push_prompt_history(
        &self,
        user_id: Uuid,
        prompt: &str,
        keep: usize,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        let profile = state
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::empty(user_id));
        append_to_history(&mut profile.prompt_history, prompt, keep);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::journal_entry::Mood;
    use chrono::Duration;

    fn new_entry(text: &str) -> NewJournalEntry {
        NewJournalEntry {
            mood: Mood::Okay,
            pain_level: 4,
            entry_text: text.into(),
            analysis: None,
        }
    }

    fn seeded(user_id: Uuid, at: DateTime<Utc>) -> JournalEntry {
        JournalEntry {
            id: Uuid::new_v4(),
            user_id,
            date: EntryDate::Instant(at),
            mood: Mood::Sad,
            pain_level: 7,
            entry_text: "seeded".into(),
            analysis: None,
        }
    }

    #[tokio::test]
    async fn test_insert_stamps_server_timestamp() {
        let store = MemoryJournalStore::new();
        let user = Uuid::new_v4();
        let entry = store.insert_entry(user, new_entry("hello")).await.unwrap();
        assert!(matches!(entry.date, EntryDate::ServerTimestamp(_)));
        assert_eq!(entry.user_id, user);
        assert_eq!(store.all_entries(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_insert_same_day_conflicts() {
        let store = MemoryJournalStore::new();
        let user = Uuid::new_v4();
        store.insert_entry(user, new_entry("first")).await.unwrap();

        let err = store.insert_entry(user, new_entry("second")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.all_entries(user).await.unwrap().len(), 1);

        // other users are unaffected
        assert!(store.insert_entry(Uuid::new_v4(), new_entry("x")).await.is_ok());
    }

    #[tokio::test]
    async fn test_entries_are_scoped_per_user() {
        let store = MemoryJournalStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.insert_entry(alice, new_entry("a")).await.unwrap();
        assert!(store.all_entries(bob).await.unwrap().is_empty());
        assert!(store.latest_entry(bob).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_range_is_half_open_and_newest_first() {
        let store = MemoryJournalStore::new();
        let user = Uuid::new_v4();
        let base = Utc::now() - Duration::days(10);
        for d in 0..5 {
            store.import_entry(seeded(user, base + Duration::days(d))).await;
        }

        let found = store
            .entries_between(user, base + Duration::days(1), base + Duration::days(3), None)
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].recorded_at() > found[1].recorded_at());

        let limited = store
            .entries_between(user, base, base + Duration::days(5), Some(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].recorded_at(), base + Duration::days(4));
    }

    #[tokio::test]
    async fn test_profile_merge_upsert() {
        let store = MemoryJournalStore::new();
        let user = Uuid::new_v4();
        assert_eq!(store.profile(user).await.unwrap(), UserProfile::empty(user));

        store.push_prompt_history(user, "p1", 10).await.unwrap();
        let now = Utc::now();
        store.set_last_prompt_date(user, now).await.unwrap();

        let profile = store.profile(user).await.unwrap();
        assert_eq!(profile.last_prompt_date, Some(now));
        assert_eq!(profile.prompt_history, vec!["p1".to_string()]);
    }

    #[tokio::test]
    async fn test_prompt_history_keeps_newest() {
        let store = MemoryJournalStore::new();
        let user = Uuid::new_v4();
        for i in 0..5 {
            store.push_prompt_history(user, &format!("p{i}"), 3).await.unwrap();
        }
        let profile = store.profile(user).await.unwrap();
        assert_eq!(profile.prompt_history, vec!["p2", "p3", "p4"]);
    }
}
