//! Next-action policy for the home screen.
//!
//! One ladder, first match wins, exactly one suggestion per evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::journal_entry::JournalEntry;
use crate::services::streak::calculate_streak;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CtaAction {
    StartJournal,
    ContinueJournal,
    ViewInsights,
    SetGoal,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CtaConfig {
    pub text: String,
    pub action: CtaAction,
    /// Higher wins.
    pub priority: u8,
    /// Why this CTA is shown.
    pub context: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub has_checked_in_today: bool,
    pub recent_entry: Option<JournalEntry>,
    pub total_entries: usize,
    pub current_streak: u32,
    pub last_active_date: Option<DateTime<Utc>>,
}

impl UserContext {
    /// Rebuilds the context from a fresh read of the user's entries.
    pub fn derive(
        entries: &[JournalEntry],
        recent_entry: Option<JournalEntry>,
        has_checked_in_today: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            has_checked_in_today,
            last_active_date: recent_entry.as_ref().map(JournalEntry::recorded_at),
            recent_entry,
            total_entries: entries.len(),
            current_streak: calculate_streak(entries, now),
        }
    }
}

pub fn select_cta(ctx: &UserContext) -> CtaConfig {
    if ctx.total_entries == 0 {
        return cta(
            "Start Your First Journal Entry",
            CtaAction::StartJournal,
            100,
            "Welcome! Begin your journaling journey.",
        );
    }

    if !ctx.has_checked_in_today {
        return cta(
            "Start Today's Reflection",
            CtaAction::StartJournal,
            90,
            "Your daily check-in is waiting.",
        );
    }

    if ctx.current_streak > 0 && ctx.current_streak % 7 == 0 {
        return cta(
            format!("Celebrate {} Days!", ctx.current_streak),
            CtaAction::ViewInsights,
            80,
            "Amazing consistency! See your progress.",
        );
    }

    if ctx.recent_entry.is_some() {
        return cta(
            "Explore Your Journey",
            CtaAction::ViewInsights,
            70,
            "Reflect on your recent thoughts and patterns.",
        );
    }

    cta(
        "Continue Your Practice",
        CtaAction::StartJournal,
        60,
        "Every entry brings new insights.",
    )
}

/// Prominent display: high-priority suggestions, and always while today's
/// check-in is outstanding.
pub fn should_show_cta(ctx: &UserContext) -> bool {
    select_cta(ctx).priority >= 70 || !ctx.has_checked_in_today
}

pub fn encouragement_message(ctx: &UserContext) -> String {
    if ctx.has_checked_in_today && ctx.current_streak > 1 {
        return format!(
            "{} day streak! You're building a powerful habit.",
            ctx.current_streak
        );
    }

    if ctx.total_entries >= 10 {
        return "Your journal is becoming a rich collection of insights.".into();
    }

    if ctx.total_entries >= 3 {
        return "You're developing a meaningful practice.".into();
    }

    "Every entry is a step toward better self-understanding.".into()
}

fn cta(text: impl Into<String>, action: CtaAction, priority: u8, context: &str) -> CtaConfig {
    CtaConfig {
        text: text.into(),
        action,
        priority,
        context: context.to_string(),
    }
}
