pub mod news;
pub mod quiz;
pub mod scrape;
pub mod scripts;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}
