//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener
//! - Start the accept loop on its own task
//!
//! # Design Decisions
//! - Fail fast: a bind error is fatal and returned before any signal wait
//! - Listener starts last (traffic only when ready)

use tokio::sync::mpsc;

use crate::config::ListenerConfig;
use crate::http::{HttpServer, ServerHandle};
use crate::lifecycle::LifecycleError;
use crate::net::Listener;
use crate::worker::Worker;

/// Bind the listener and begin serving `worker` on a background task.
pub async fn start_server<W: Worker>(
    config: &ListenerConfig,
    worker: W,
    serve_errors: mpsc::UnboundedSender<LifecycleError>,
) -> Result<ServerHandle, LifecycleError> {
    let listener = Listener::bind(config).await.map_err(LifecycleError::Bind)?;
    Ok(HttpServer::new(worker).spawn(listener, serve_errors))
}
