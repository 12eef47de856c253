use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::journal_entry::JournalEntry;
use crate::services::dates::{is_same_day, today_start};

/// Consecutive days with an entry, walking back from today.
///
/// Anchored to today rather than to the latest entry: a user who missed
/// today has a streak of 0 no matter what came before. Same-day duplicates
/// are not collapsed, so a duplicate stops the walk at its position.
pub fn calculate_streak(entries: &[JournalEntry], now: DateTime<Utc>) -> u32 {
    if entries.is_empty() {
        return 0;
    }

    let mut sorted: Vec<&JournalEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| std::cmp::Reverse(e.recorded_at()));

    let today = today_start(now);
    let mut streak = 0u32;

    for (i, entry) in sorted.iter().enumerate() {
        let expected = today - Duration::days(i as i64);
        if is_same_day(entry.date, expected) {
            streak += 1;
        } else {
            break;
        }
    }

    streak
}

/// Longest run of consecutive calendar days anywhere in the history.
pub fn longest_streak(entries: &[JournalEntry]) -> u32 {
    let mut days: Vec<NaiveDate> = entries.iter().map(|e| e.recorded_at().date_naive()).collect();
    days.sort_unstable();
    days.dedup();

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for day in days {
        run = match prev {
            Some(p) if day == p + Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    longest
}
