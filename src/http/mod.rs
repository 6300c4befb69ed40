//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, hyper connection, graceful close)
//!     → request.rs (assign request ID, build WorkRequest)
//!     → Worker::handle
//!     → response.rs (WorkResponse / WorkError → HTTP)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, HttpServer, ServerHandle, RESOURCE_PATH};
