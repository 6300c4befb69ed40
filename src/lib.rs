//! Graceful HTTP service library.
//!
//! One listener serves slow units of work; a lifecycle coordinator stops
//! admitting new work on the first termination signal and gives admitted
//! work a bounded grace period to finish.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod worker;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::{Coordinator, LifecycleError, LifecycleState, ShutdownGate};
pub use worker::{SlowWorker, Worker};
