//! # Havyn: Request/Response DTOs
//!
//! All API contract types in one module.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body or query params
//! - `*Response` → serialized to client JSON
//! - Field validation is expressed via `validator` derive macros

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::journal_entry::{EntryAnalysis, JournalEntry, Mood};
use crate::services::check_in::AnalysisStatus;
use crate::services::claude::PromptType;
use crate::services::cta::CtaConfig;
use crate::services::prompts::PromptSource;

// ============================================================================
// Entries
// ============================================================================

/// Entry as returned to clients; the date is always a canonical instant.
#[derive(Debug, Serialize, Deserialize)]
pub struct JournalEntryResponse {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub mood: Mood,
    pub pain_level: i16,
    pub entry_text: String,
    pub analysis: Option<EntryAnalysis>,
}

impl From<JournalEntry> for JournalEntryResponse {
    fn from(e: JournalEntry) -> Self {
        Self {
            id: e.id,
            date: e.recorded_at(),
            mood: e.mood,
            pain_level: e.pain_level,
            entry_text: e.entry_text,
            analysis: e.analysis,
        }
    }
}

/// GET /api/entries query params
#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    /// Inclusive. Default: 30 days ago
    pub start_date: Option<NaiveDate>,
    /// Inclusive. Default: today
    pub end_date: Option<NaiveDate>,
}

/// GET /api/entries/calendar query params
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    /// Number of months to fetch. Default: 3, max: 12
    pub months: Option<i32>,
}

impl CalendarQuery {
    pub fn months_clamped(&self) -> i64 {
        i64::from(self.months.unwrap_or(3).clamp(1, 12))
    }
}

/// Single day in the calendar heat-map
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Mood of the latest entry that day
    pub mood: Mood,
    pub pain_level: i16,
    pub count: usize,
}

// ============================================================================
// Check-ins
// ============================================================================

/// POST /api/check-ins
#[derive(Debug, Deserialize, Validate)]
pub struct CheckInRequest {
    pub mood: Mood,

    #[validate(range(min = 0, max = 10, message = "Pain level must be 0-10"))]
    pub pain_level: i16,

    #[validate(length(min = 1, max = 20000, message = "Entry must be 1-20000 characters"))]
    pub entry_text: String,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub entry: JournalEntryResponse,
    pub analysis: AnalysisStatus,
}

/// GET /api/check-ins/today
#[derive(Debug, Serialize)]
pub struct TodayStatusResponse {
    pub has_checked_in_today: bool,
    pub can_check_in: bool,
}

// ============================================================================
// Home screen
// ============================================================================

/// GET /api/cta
#[derive(Debug, Serialize)]
pub struct CtaResponse {
    pub cta: CtaConfig,
    pub encouragement: String,
    pub should_show: bool,
}

/// GET /api/stats
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_date: Option<DateTime<Utc>>,
}

// ============================================================================
// Prompts
// ============================================================================

/// POST /api/prompts
#[derive(Debug, Default, Deserialize, Validate)]
pub struct GeneratePromptRequest {
    pub mood: Option<Mood>,

    #[validate(length(max = 2000, message = "Recent thoughts must be under 2000 characters"))]
    pub recent_thoughts: Option<String>,

    /// Default: "check-in"
    pub prompt_type: Option<PromptType>,
}

/// Response for GET /api/prompts/next and POST /api/prompts
#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub prompt: String,
    pub source: PromptSource,
    /// Whether the model was asked for a fresh prompt
    pub refreshed: bool,
}

// ============================================================================
// System
// ============================================================================

/// GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_in_request_validation() {
        let ok: CheckInRequest = serde_json::from_str(
            r#"{"mood": "Anxious", "pain_level": 6, "entry_text": "Busy day"}"#,
        )
        .unwrap();
        assert!(ok.validate().is_ok());

        let bad: CheckInRequest =
            serde_json::from_str(r#"{"mood": "Sad", "pain_level": 11, "entry_text": ""}"#).unwrap();
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("pain_level"));
        assert!(fields.contains_key("entry_text"));
    }

    #[test]
    fn test_unknown_mood_rejected() {
        let result: Result<CheckInRequest, _> =
            serde_json::from_str(r#"{"mood": "Ecstatic", "pain_level": 1, "entry_text": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_in_response_shape() {
        let response = CheckInResponse {
            entry: JournalEntryResponse {
                id: Uuid::nil(),
                date: Utc::now(),
                mood: Mood::Okay,
                pain_level: 2,
                entry_text: "Quiet evening".into(),
                analysis: None,
            },
            analysis: AnalysisStatus::Failed {
                reason: "model not configured".into(),
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["analysis"]["status"], "failed");
        assert_eq!(json["analysis"]["reason"], "model not configured");
        assert!(json["entry"]["analysis"].is_null());

        let ok = serde_json::to_value(AnalysisStatus::Completed).unwrap();
        assert_eq!(ok, serde_json::json!({ "status": "completed" }));
    }

    #[test]
    fn test_calendar_months_clamped() {
        assert_eq!(CalendarQuery { months: None }.months_clamped(), 3);
        assert_eq!(CalendarQuery { months: Some(40) }.months_clamped(), 12);
        assert_eq!(CalendarQuery { months: Some(-2) }.months_clamped(), 1);
    }
}
