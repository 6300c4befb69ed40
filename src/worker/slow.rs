//! Reference worker: a fixed-duration operation with a fixed payload.

use std::time::Duration;

use crate::config::WorkerConfig;
use crate::worker::{WorkError, WorkRequest, WorkResponse, Worker};

/// Payload returned by every successful [`SlowWorker`] invocation.
pub const PROCESSED_MESSAGE: &str = "Request processed";

/// Worker that occupies its request for a fixed processing time.
#[derive(Debug, Clone)]
pub struct SlowWorker {
    processing: Duration,
}

impl SlowWorker {
    pub fn new(processing: Duration) -> Self {
        Self { processing }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.processing())
    }
}

impl Worker for SlowWorker {
    async fn handle(&self, request: WorkRequest) -> Result<WorkResponse, WorkError> {
        tracing::info!(request_id = %request.id, path = %request.path, "Received request");

        tokio::time::sleep(self.processing).await;

        tracing::info!(
            request_id = %request.id,
            processing_ms = self.processing.as_millis() as u64,
            "Processed request"
        );
        Ok(WorkResponse::new(PROCESSED_MESSAGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn request() -> WorkRequest {
        WorkRequest {
            id: "req-1".into(),
            method: "GET".into(),
            path: "/v1/resource".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn takes_the_configured_processing_time() {
        let worker = SlowWorker::new(Duration::from_secs(10));
        let start = Instant::now();

        let response = worker.handle(request()).await.unwrap();

        assert_eq!(response.message, PROCESSED_MESSAGE);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn is_still_running_before_processing_time_elapses() {
        let worker = SlowWorker::new(Duration::from_secs(10));
        let result =
            tokio::time::timeout(Duration::from_secs(9), worker.handle(request())).await;
        assert!(result.is_err(), "worker must not finish early");
    }

    #[test]
    fn response_serializes_to_message_object() {
        let body = serde_json::to_value(WorkResponse::new(PROCESSED_MESSAGE)).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "Request processed" }));
    }
}
