use axum::{extract::State, Extension, Json};
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::StoreError;
use crate::dto::{GeneratePromptRequest, PromptResponse};
use crate::error::{AppError, AppResult};
use crate::models::journal_entry::JournalEntry;
use crate::services::dates::tomorrow_start;
use crate::services::prompts::{
    generate_reflection_prompt, quick_check_in_prompt, should_generate_new_prompt,
    PromptContext, PromptResult, PromptSource, PROMPT_HISTORY_LEN,
};
use crate::AppState;

const RECENT_ENTRY_DAYS: i64 = 7;
const RECENT_ENTRY_LIMIT: i64 = 5;

/// Prompt for the journal screen: a fresh one from the model when due,
/// otherwise a quick local check-in prompt.
pub async fn next_prompt(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<PromptResponse>> {
    let now = Utc::now();
    let profile = state.store.profile(auth_user.id).await?;

    if !should_generate_new_prompt(profile.last_prompt_date, &profile.prompt_history, now) {
        return Ok(Json(PromptResponse {
            prompt: quick_check_in_prompt().to_string(),
            source: PromptSource::Quick,
            refreshed: false,
        }));
    }

    let recent = load_recent_entries(&state, auth_user.id).await?;
    let ctx = PromptContext {
        recent_entries: &recent,
        prompt_history: &profile.prompt_history,
        ..Default::default()
    };

    let result = generate_reflection_prompt(state.model.as_ref(), &ctx).await;
    remember_prompt(&state, auth_user.id, &result).await;

    Ok(Json(PromptResponse {
        prompt: result.prompt,
        source: result.source,
        refreshed: true,
    }))
}

/// Explicit generation from the chat view.
pub async fn generate_prompt(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<GeneratePromptRequest>,
) -> AppResult<Json<PromptResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (profile, recent) = tokio::try_join!(
        state.store.profile(auth_user.id),
        load_recent_entries(&state, auth_user.id),
    )?;

    let ctx = PromptContext {
        mood: body.mood,
        recent_thoughts: body.recent_thoughts,
        recent_entries: &recent,
        prompt_history: &profile.prompt_history,
        prompt_type: body.prompt_type.unwrap_or_default(),
    };

    let result = generate_reflection_prompt(state.model.as_ref(), &ctx).await;
    remember_prompt(&state, auth_user.id, &result).await;

    Ok(Json(PromptResponse {
        prompt: result.prompt,
        source: result.source,
        refreshed: true,
    }))
}

async fn load_recent_entries(
    state: &AppState,
    user_id: Uuid,
) -> Result<Vec<JournalEntry>, StoreError> {
    let now = Utc::now();
    state
        .store
        .entries_between(
            user_id,
            now - Duration::days(RECENT_ENTRY_DAYS),
            tomorrow_start(now),
            Some(RECENT_ENTRY_LIMIT),
        )
        .await
}

/// Only model-written prompts enter the history. A failed write is logged
/// and the prompt is still served.
async fn remember_prompt(state: &AppState, user_id: Uuid, result: &PromptResult) {
    if result.source != PromptSource::Ai {
        return;
    }

    if let Err(e) = state
        .store
        .push_prompt_history(user_id, &result.prompt, PROMPT_HISTORY_LEN)
        .await
    {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to record prompt history");
    }
}
