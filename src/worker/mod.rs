//! Worker endpoint subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP request (GET /v1/resource)
//!     → http/request.rs (build WorkRequest descriptor)
//!     → Worker::handle (may suspend for a long time)
//!     → http/response.rs (WorkResponse → 200, WorkError → 500)
//! ```
//!
//! # Design Decisions
//! - Workers are stateless per invocation; shared state lives behind `&self`
//! - An invocation is never cancelled cooperatively; it runs to completion or
//!   its connection is torn down after a drain timeout
//! - The lifecycle never assumes a worker succeeds

pub mod slow;

use std::future::Future;

use serde::Serialize;

pub use slow::SlowWorker;

/// Opaque descriptor for one unit of externally triggered work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkRequest {
    /// Correlation ID (the `x-request-id` header).
    pub id: String,
    /// HTTP method the request arrived with.
    pub method: String,
    /// Request path.
    pub path: String,
}

/// Successful result of a unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkResponse {
    pub message: String,
}

impl WorkResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure of a unit of work.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkError {
    #[error("work failed: {0}")]
    Failed(String),
}

/// A unit of work invoked once per admitted request.
pub trait Worker: Send + Sync + 'static {
    /// Process one request.
    fn handle(
        &self,
        request: WorkRequest,
    ) -> impl Future<Output = Result<WorkResponse, WorkError>> + Send;
}
