use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::services::dates::{to_canonical_date, EntryDate};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "mood")]
pub enum Mood {
    Happy,
    Calm,
    Okay,
    Anxious,
    Sad,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "Happy",
            Self::Calm => "Calm",
            Self::Okay => "Okay",
            Self::Anxious => "Anxious",
            Self::Sad => "Sad",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Themes, emotions and a summary produced by the analysis model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryAnalysis {
    pub themes: Vec<String>,
    pub emotions: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: EntryDate,
    pub mood: Mood,
    pub pain_level: i16,
    pub entry_text: String,
    pub analysis: Option<EntryAnalysis>,
}

impl JournalEntry {
    pub fn recorded_at(&self) -> DateTime<Utc> {
        to_canonical_date(self.date)
    }
}

/// Fields supplied at check-in; the store assigns `id` and `date`.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub mood: Mood,
    pub pain_level: i16,
    pub entry_text: String,
    pub analysis: Option<EntryAnalysis>,
}

#[derive(Debug, FromRow)]
pub struct JournalEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub mood: Mood,
    pub pain_level: i16,
    pub entry_text: String,
    pub analysis: Option<sqlx::types::Json<EntryAnalysis>>,
}

impl From<JournalEntryRow> for JournalEntry {
    fn from(row: JournalEntryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            date: EntryDate::Instant(row.recorded_at),
            mood: row.mood,
            pain_level: row.pain_level,
            entry_text: row.entry_text,
            analysis: row.analysis.map(|json| json.0),
        }
    }
}
