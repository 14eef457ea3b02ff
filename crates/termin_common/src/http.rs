// --- File: crates/termin_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{HttpStatusCode, TerminError};

// Include the client module
pub mod client;

/// Extension trait for TerminError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for TerminError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "code": status_code.as_u16(),
                "reason": self.reason(),
            }
        }));

        (status_code, body).into_response()
    }
}

/// Implement IntoResponse for TerminError so handlers can return it directly.
impl IntoResponse for TerminError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_carries_status() {
        let response = TerminError::SlotUnavailableError("taken".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = TerminError::QuotaExceededError("weekly".into()).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn error_body_names_the_reason() {
        let response = TerminError::BlockedError("ip".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], 403);
        assert_eq!(body["error"]["reason"], "blocked");
    }
}
