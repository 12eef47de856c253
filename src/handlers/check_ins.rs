use axum::{extract::State, Extension, Json};
use chrono::Utc;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{CheckInRequest, CheckInResponse, JournalEntryResponse, TodayStatusResponse};
use crate::error::{AppError, AppResult};
use crate::services::check_in::{self, CheckInData};
use crate::AppState;

pub async fn create_check_in(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CheckInRequest>,
) -> AppResult<Json<CheckInResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = check_in::record_daily_check_in(
        state.store.as_ref(),
        state.model.as_ref(),
        auth_user.id,
        CheckInData {
            mood: body.mood,
            pain_level: body.pain_level,
            entry_text: body.entry_text,
        },
        Utc::now(),
    )
    .await?;

    // Live feed for the user's other open sessions
    if let Some(tx) = state.ws_tx.as_ref() {
        let msg = serde_json::json!({
            "type": "entry_created",
            "user_id": auth_user.id,
            "entry_id": outcome.entry.id,
        });
        let _ = tx.send(msg.to_string());
    }

    Ok(Json(CheckInResponse {
        entry: JournalEntryResponse::from(outcome.entry),
        analysis: outcome.analysis,
    }))
}

pub async fn today_status(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<TodayStatusResponse>> {
    let has_checked_in_today =
        check_in::has_today_check_in(state.store.as_ref(), auth_user.id, Utc::now()).await?;

    Ok(Json(TodayStatusResponse {
        has_checked_in_today,
        can_check_in: !has_checked_in_today,
    }))
}
