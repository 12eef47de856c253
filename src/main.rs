use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use havyn_api::auth::rate_limit::spawn_rate_limit_cleanup;
use havyn_api::config::Config;
use havyn_api::db::{self, JournalStore, MemoryJournalStore, PgJournalStore};
use havyn_api::services::claude::ClaudeClient;
use havyn_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "havyn_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    let store: Arc<dyn JournalStore> = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::pool::create_pool(url)
                .await
                .context("Failed to connect to database")?;
            let store = PgJournalStore::new(pool);
            store
                .migrate()
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory journal store");
            Arc::new(MemoryJournalStore::new())
        }
    };

    if config.claude_api_key.is_empty() {
        tracing::warn!("CLAUDE_API_KEY not set, prompts and analysis use local fallbacks");
    }
    let model = ClaudeClient::new(
        config.claude_api_key.clone(),
        config.claude_model.clone(),
        Duration::from_secs(config.claude_timeout_secs),
    )
    .context("Failed to build Claude HTTP client")?;

    let state = AppState::new(store, Arc::new(model), config.clone());
    spawn_rate_limit_cleanup(
        state.rate_limiter.clone(),
        config.prompt_rate_limit_window_secs,
    );

    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
