// Aggregation triggers. Both always answer 200 so external schedulers never
// see a hard failure; problems are reported in the body and the scrape log.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use tracing::{error, info, warn};

use radar_scout::fanout::{settle, Settled};
use radar_scout::{AggregationResult, Aggregator};

use crate::AppState;

pub const GET_HANDLER_SOURCE: &str = "GET-handler";
pub const POST_HANDLER_SOURCE: &str = "POST-handler";

fn aggregator(state: &AppState) -> Aggregator {
    Aggregator::new(
        state.fetchers.clone(),
        state.stories.clone(),
        state.scrape_log.clone(),
    )
}

pub async fn api_scrape(State(state): State<Arc<AppState>>) -> Response {
    let aggregator = aggregator(&state);
    match settle(async { Ok::<_, anyhow::Error>(aggregator.run().await) }).await {
        Settled::Fulfilled(result) => {
            info!(count = result.count, failed = result.failure_count, "Scrape finished");
            Json(result_body(&result)).into_response()
        }
        Settled::Rejected(message) => {
            soft_failure(&state, GET_HANDLER_SOURCE, "Some sources failed to scrape", message).await
        }
    }
}

/// Same pipeline, one fetcher at a time.
pub async fn api_scrape_sequential(State(state): State<Arc<AppState>>) -> Response {
    let aggregator = aggregator(&state);
    match settle(async { Ok::<_, anyhow::Error>(aggregator.run_sequential().await) }).await {
        Settled::Fulfilled(result) => Json(serde_json::json!({
            "success": true,
            "count": result.count,
        }))
        .into_response(),
        Settled::Rejected(message) => {
            soft_failure(&state, POST_HANDLER_SOURCE, "Failed to scrape news", message).await
        }
    }
}

fn result_body(result: &AggregationResult) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "count": result.count,
        "sources": result.sources,
        "successfulSources": result.success_count,
        "failedSources": result.failure_count,
        "inserted": result.inserted,
        "timestamp": Utc::now().to_rfc3339(),
    })
}

async fn soft_failure(state: &AppState, source: &str, summary: &str, details: String) -> Response {
    error!(source, error = details.as_str(), "{summary}");
    if let Err(e) = state.scrape_log.record(source, &details).await {
        warn!(error = %e, "Failed to record handler failure");
    }
    Json(serde_json::json!({
        "success": false,
        "error": summary,
        "details": details,
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}
