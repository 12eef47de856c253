use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, NaiveDate, Utc};

use crate::auth::middleware::AuthUser;
use crate::dto::{CalendarDay, CalendarQuery, EntryQuery, JournalEntryResponse};
use crate::error::{AppError, AppResult};
use crate::models::journal_entry::JournalEntry;
use crate::services::dates::{day_start, tomorrow_start};
use crate::AppState;

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<EntryQuery>,
) -> AppResult<Json<Vec<JournalEntryResponse>>> {
    let today = Utc::now().date_naive();
    let start = query.start_date.unwrap_or(today - Duration::days(30));
    let end = query.end_date.unwrap_or(today);

    if start > end {
        return Err(AppError::Validation(
            "start_date must not be after end_date".into(),
        ));
    }

    let entries = fetch_days(&state, &auth_user, start, end).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Calendar heat-map: one cell per day that has at least one entry.
pub async fn get_calendar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<Vec<CalendarDay>>> {
    let end = Utc::now().date_naive();
    let start = end - Duration::days(query.months_clamped() * 30);

    let entries = fetch_days(&state, &auth_user, start, end).await?;
    Ok(Json(calendar_days(&entries)))
}

/// Entries on the inclusive day range `[start, end]`, newest first.
async fn fetch_days(
    state: &AppState,
    auth_user: &AuthUser,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<JournalEntry>> {
    let from = day_start(start);
    let until = tomorrow_start(day_start(end));

    Ok(state
        .store
        .entries_between(auth_user.id, from, until, None)
        .await?)
}

/// Buckets entries by UTC day, oldest day first. Mood and pain come from the
/// latest entry of each day.
pub fn calendar_days(entries: &[JournalEntry]) -> Vec<CalendarDay> {
    let mut days: BTreeMap<NaiveDate, (&JournalEntry, usize)> = BTreeMap::new();

    for entry in entries {
        let day = entry.recorded_at().date_naive();
        days.entry(day)
            .and_modify(|(latest, count)| {
                *count += 1;
                if entry.recorded_at() > latest.recorded_at() {
                    *latest = entry;
                }
            })
            .or_insert((entry, 1));
    }

    days.into_iter()
        .map(|(date, (latest, count))| CalendarDay {
            date,
            mood: latest.mood,
            pain_level: latest.pain_level,
            count,
        })
        .collect()
}
