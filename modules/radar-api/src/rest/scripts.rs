use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;

use radar_common::Llm;
use radar_scout::ScriptError;

use super::error_response;
use crate::AppState;

#[derive(Deserialize)]
pub struct ScriptQuery {
    llm: Option<String>,
}

pub async fn api_generate_weekly_script(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScriptQuery>,
) -> Response {
    let selection = match params.llm.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<Llm>() {
            Ok(llm) => Some(llm),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        },
    };

    match state.scripts.generate(selection).await {
        Ok(run) => Json(run).into_response(),
        Err(e) => {
            let status = match e {
                ScriptError::NoRecentStories => StatusCode::NOT_FOUND,
                ScriptError::NotEnoughStories { .. } => StatusCode::BAD_REQUEST,
                ScriptError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            warn!(error = %e, "Weekly script not generated");
            error_response(status, e.to_string())
        }
    }
}
