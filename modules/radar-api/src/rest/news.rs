use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;

use radar_common::{NewsQuery, NewsSort};

use super::error_response;
use crate::AppState;

#[derive(Deserialize)]
pub struct NewsParams {
    platform: Option<String>,
    category: Option<String>,
    q: Option<String>,
    sort: Option<NewsSort>,
}

pub async fn api_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NewsParams>,
) -> Response {
    let query = match NewsQuery::from_params(
        params.platform.as_deref(),
        params.category.as_deref(),
        params.q.as_deref(),
        params.sort,
    ) {
        Ok(query) => query,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.stories.list_stories().await {
        Ok(stories) => Json(query.apply(stories)).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load news");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load news")
        }
    }
}
