//! HTTP surface: aggregation and script triggers, the news read path and the
//! quiz endpoints.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use radar_scout::{NewsFetcher, ScriptGenerator};
use radar_store::{QuizStore, ScrapeLog, StoryStore};

pub mod rest;

pub struct AppState {
    pub stories: Arc<dyn StoryStore>,
    pub scrape_log: Arc<dyn ScrapeLog>,
    pub quizzes: Arc<dyn QuizStore>,
    pub fetchers: Vec<Arc<dyn NewsFetcher>>,
    pub scripts: ScriptGenerator,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // News pipeline
        .route(
            "/api/scrape",
            get(rest::scrape::api_scrape).post(rest::scrape::api_scrape_sequential),
        )
        .route(
            "/api/generate-weekly-script",
            get(rest::scripts::api_generate_weekly_script),
        )
        .route("/api/news", get(rest::news::api_news))
        // Quizzes
        .route(
            "/api/quizzes/{quiz_id}/questions",
            get(rest::quiz::api_questions),
        )
        .route(
            "/api/quizzes/{quiz_id}/progress/{admission_number}",
            get(rest::quiz::api_load_progress).put(rest::quiz::api_save_progress),
        )
        .route(
            "/api/quizzes/{quiz_id}/submissions",
            post(rest::quiz::api_submit),
        )
        .route(
            "/api/quizzes/{quiz_id}/submissions/{admission_number}",
            get(rest::quiz::api_submission),
        )
        .route(
            "/api/quizzes/{quiz_id}/leaderboard",
            get(rest::quiz::api_leaderboard),
        )
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Method and path only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
