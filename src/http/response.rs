//! Response mapping for worker results.
//!
//! Successful work is returned as `200 OK` with the payload as JSON; a failed
//! unit of work becomes `500 Internal Server Error` with an `error` field.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::worker::{WorkError, WorkResponse};

impl IntoResponse for WorkResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl IntoResponse for WorkError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Status code a worker result maps to.
pub fn status_of(result: &Result<WorkResponse, WorkError>) -> StatusCode {
    match result {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_results_to_status_codes() {
        assert_eq!(status_of(&Ok(WorkResponse::new("done"))), StatusCode::OK);
        assert_eq!(
            status_of(&Err(WorkError::Failed("boom".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn error_body_carries_message() {
        let response = WorkError::Failed("disk full".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "work failed: disk full" }));
    }
}
