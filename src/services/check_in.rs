use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{JournalStore, StoreError};
use crate::models::journal_entry::{JournalEntry, Mood, NewJournalEntry};
use crate::services::claude::ReflectionModel;
use crate::services::dates::{today_start, tomorrow_start};

pub const MAX_PAIN_LEVEL: i16 = 10;

#[derive(Debug, Clone)]
pub struct CheckInData {
    pub mood: Mood,
    pub pain_level: i16,
    pub entry_text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisStatus {
    Completed,
    /// Entry saved without analysis.
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub entry: JournalEntry,
    pub analysis: AnalysisStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    #[error("Please write something in your journal")]
    EmptyEntry,

    #[error("Pain level must be between 0 and 10, got {0}")]
    PainLevelOutOfRange(i16),

    #[error("You have already checked in today")]
    AlreadyCheckedIn,

    #[error("Failed to save check-in: {0}")]
    Persistence(#[from] StoreError),
}

/// Records today's check-in.
///
/// Order: preconditions, the once-per-day gate, analysis, the entry write,
/// then the advisory `last_prompt_date` marker. Only the gate read and the
/// entry write can fail the call.
pub async fn record_daily_check_in(
    store: &dyn JournalStore,
    model: &dyn ReflectionModel,
    user_id: Uuid,
    data: CheckInData,
    now: DateTime<Utc>,
) -> Result<CheckInOutcome, CheckInError> {
    if data.entry_text.trim().is_empty() {
        return Err(CheckInError::EmptyEntry);
    }
    if !(0..=MAX_PAIN_LEVEL).contains(&data.pain_level) {
        return Err(CheckInError::PainLevelOutOfRange(data.pain_level));
    }

    if has_today_check_in(store, user_id, now).await? {
        return Err(CheckInError::AlreadyCheckedIn);
    }

    let (analysis, status) = match model.analyze_entry(&data.entry_text).await {
        Ok(analysis) => (Some(analysis), AnalysisStatus::Completed),
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Analysis failed, saving entry without it");
            (
                None,
                AnalysisStatus::Failed {
                    reason: e.to_string(),
                },
            )
        }
    };

    let entry = store
        .insert_entry(
            user_id,
            NewJournalEntry {
                mood: data.mood,
                pain_level: data.pain_level,
                entry_text: data.entry_text,
                analysis,
            },
        )
        .await
        .map_err(|e| match e {
            // lost a race with a concurrent check-in
            StoreError::Conflict(_) => CheckInError::AlreadyCheckedIn,
            other => CheckInError::Persistence(other),
        })?;

    if let Err(e) = store.set_last_prompt_date(user_id, now).await {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to update last prompt date");
    }

    tracing::info!(user_id = %user_id, entry_id = %entry.id, "Check-in recorded");

    Ok(CheckInOutcome {
        entry,
        analysis: status,
    })
}

pub async fn has_today_check_in(
    store: &dyn JournalStore,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let today = store
        .entries_between(user_id, today_start(now), tomorrow_start(now), Some(1))
        .await?;
    Ok(!today.is_empty())
}

pub async fn recent_check_in(
    store: &dyn JournalStore,
    user_id: Uuid,
) -> Result<Option<JournalEntry>, StoreError> {
    store.latest_entry(user_id).await
}
