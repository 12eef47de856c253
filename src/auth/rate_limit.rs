use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::AppState;

/// Fixed-window counters keyed by caller (single-instance deployments).
#[derive(Clone, Default)]
pub struct RateLimitState {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the remaining allowance, or how long to wait once exhausted.
    pub async fn check_with_limits(
        &self,
        key: &str,
        max_requests: u32,
        window_secs: u64,
    ) -> Result<u32, Duration> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(window_secs);

        let entry = entries.entry(key.to_string()).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) > window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= max_requests {
            let retry_after = window.saturating_sub(now.duration_since(entry.window_start));
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(max_requests - entry.count)
    }

    /// Drops entries idle for more than two windows.
    pub async fn cleanup(&self, window_secs: u64) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let keep_for = Duration::from_secs(window_secs * 2);

        entries.retain(|_, entry| now.duration_since(entry.window_start) < keep_for);
    }
}

/// Limits calls to the prompt endpoints, which may reach the model API.
/// Must run inside `require_auth`.
pub async fn rate_limit_prompts(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = format!("prompts:{}", auth_user.id);
    let max = state.config.prompt_rate_limit_max;
    let window = state.config.prompt_rate_limit_window_secs;

    match state.rate_limiter.check_with_limits(&key, max, window).await {
        Ok(remaining) => {
            tracing::debug!(user_id = %auth_user.id, remaining = remaining, "Prompt rate limit check passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                user_id = %auth_user.id,
                retry_after_secs = retry_after.as_secs(),
                "Prompt rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}

/// Periodically prunes idle rate limit entries.
pub fn spawn_rate_limit_cleanup(limiter: RateLimitState, window_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(window_secs.max(1) * 2));
        loop {
            interval.tick().await;
            limiter.cleanup(window_secs).await;
        }
    });
}
