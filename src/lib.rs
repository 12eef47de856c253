use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use auth::rate_limit::RateLimitState;
use config::Config;
use db::JournalStore;
use services::claude::ReflectionModel;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JournalStore>,
    pub model: Arc<dyn ReflectionModel>,
    pub config: Arc<Config>,
    pub ws_tx: Option<broadcast::Sender<String>>,
    pub rate_limiter: RateLimitState,
}

impl AppState {
    pub fn new(
        store: Arc<dyn JournalStore>,
        model: Arc<dyn ReflectionModel>,
        config: Arc<Config>,
    ) -> Self {
        let (ws_tx, _) = broadcast::channel::<String>(256);
        Self {
            store,
            model,
            config,
            ws_tx: Some(ws_tx),
            rate_limiter: RateLimitState::new(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler));

    // Both may reach the model API
    let prompt_routes = Router::new()
        .route("/api/prompts/next", get(handlers::prompts::next_prompt))
        .route("/api/prompts", post(handlers::prompts::generate_prompt))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_prompts,
        ));

    let protected_routes = Router::new()
        // Check-ins
        .route("/api/check-ins", post(handlers::check_ins::create_check_in))
        .route("/api/check-ins/today", get(handlers::check_ins::today_status))
        // Entries
        .route("/api/entries", get(handlers::entries::list_entries))
        .route("/api/entries/calendar", get(handlers::entries::get_calendar))
        // Home
        .route("/api/cta", get(handlers::home::get_cta))
        .route("/api/stats", get(handlers::home::get_stats))
        .merge(prompt_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = Vec::new();
    match config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => origins.push(origin),
        Err(_) => tracing::warn!(frontend_url = %config.frontend_url, "Ignoring invalid FRONTEND_URL"),
    }
    // In dev, also allow LAN access (e.g. testing from another device)
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        origins.extend(
            extra
                .split(',')
                .filter_map(|o| o.trim().parse::<HeaderValue>().ok()),
        );
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
