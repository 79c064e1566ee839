use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{BookifyError, HttpStatusCode};

pub mod client;

/// Extension trait to convert a `BookifyError` into an Axum HTTP response.
pub trait IntoHttpResponse {
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for BookifyError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(json!({
            "message": self.to_string(),
        }));

        (status_code, body).into_response()
    }
}

impl IntoResponse for BookifyError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// Convert a `Result<T, BookifyError>` into a JSON response result, for
/// handlers that return serializable payloads.
pub fn handle_json_result<T>(result: Result<T, BookifyError>) -> Result<Json<T>, Response>
where
    T: serde::Serialize,
{
    result.map(Json).map_err(|err| err.into_response())
}
