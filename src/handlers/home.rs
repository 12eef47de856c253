use axum::{extract::State, Extension, Json};
use chrono::Utc;

use crate::auth::middleware::AuthUser;
use crate::dto::{CtaResponse, StatsResponse};
use crate::error::AppResult;
use crate::services::check_in;
use crate::services::cta::{encouragement_message, select_cta, should_show_cta, UserContext};
use crate::services::streak::{calculate_streak, longest_streak};
use crate::AppState;

/// Home-screen call to action, recomputed from the user's entries on every
/// request.
pub async fn get_cta(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<CtaResponse>> {
    let now = Utc::now();
    let store = state.store.as_ref();

    let (has_checked_in_today, recent_entry, entries) = tokio::try_join!(
        check_in::has_today_check_in(store, auth_user.id, now),
        check_in::recent_check_in(store, auth_user.id),
        store.all_entries(auth_user.id),
    )?;

    let ctx = UserContext::derive(&entries, recent_entry, has_checked_in_today, now);
    let cta = select_cta(&ctx);

    tracing::debug!(
        user_id = %auth_user.id,
        action = ?cta.action,
        priority = cta.priority,
        streak = ctx.current_streak,
        "CTA selected"
    );

    Ok(Json(CtaResponse {
        encouragement: encouragement_message(&ctx),
        should_show: should_show_cta(&ctx),
        cta,
    }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<StatsResponse>> {
    let entries = state.store.all_entries(auth_user.id).await?;

    Ok(Json(StatsResponse {
        current_streak: calculate_streak(&entries, Utc::now()),
        longest_streak: longest_streak(&entries),
        total_entries: entries.len(),
        // newest first
        last_active_date: entries.first().map(|e| e.recorded_at()),
    }))
}
