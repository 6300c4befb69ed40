//! HTTP server setup and connection serving.
//!
//! # Responsibilities
//! - Create Axum Router with the resource handler
//! - Wire up middleware (request ID, tracing)
//! - Run the accept loop on its own task
//! - Serve each connection (HTTP/1.1 and HTTP/2) on its own task
//! - On stop: refuse new connections, close connections gracefully, and
//!   forcibly close whatever is still open when the deadline passes

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, routing::get, Router};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
    service::TowerToHyperService,
};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tower_http::trace::TraceLayer;

use crate::http::request;
use crate::http::response::status_of;
use crate::lifecycle::{LifecycleError, ShutdownDeadline, ShutdownGate};
use crate::net::listener::ConnectionPermit;
use crate::net::{
    is_connection_error, ConnectionGuard, ConnectionTracker, Listener, ListenerError,
};
use crate::observability::metrics;
use crate::observability::tracing::RequestSpan;
use crate::worker::{WorkError, WorkRequest, WorkResponse, Worker};

/// Path of the single work resource.
pub const RESOURCE_PATH: &str = "/v1/resource";

const MIN_ACCEPT_BACKOFF: Duration = Duration::from_millis(5);
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Build the Axum router with all middleware layers.
pub fn build_router<W: Worker>(worker: Arc<W>) -> Router {
    Router::new()
        .route(RESOURCE_PATH, get(resource_handler::<W>))
        .with_state(worker)
        .layer(request::propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
        .layer(request::set_request_id_layer())
}

async fn resource_handler<W: Worker>(
    State(worker): State<Arc<W>>,
    request: WorkRequest,
) -> Result<WorkResponse, WorkError> {
    let start_time = Instant::now();
    let request_id = request.id.clone();

    let result = worker.handle(request).await;

    metrics::record_request(status_of(&result).as_u16(), start_time);
    if let Err(e) = &result {
        tracing::warn!(request_id = %request_id, error = %e, "Worker failed");
    }
    result
}

/// HTTP server serving one worker.
pub struct HttpServer {
    router: Router,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a new HTTP server around the given worker.
    pub fn new<W: Worker>(worker: W) -> Self {
        Self {
            router: build_router(Arc::new(worker)),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Start serving on the given listener from a background task.
    ///
    /// Listener-level accept failures are sent on `serve_errors`; they never
    /// stop the accept loop.
    pub fn spawn(
        self,
        listener: Listener,
        serve_errors: mpsc::UnboundedSender<LifecycleError>,
    ) -> ServerHandle {
        let local_addr = listener.local_addr();
        let stop = ShutdownGate::new();

        tracing::info!(address = %local_addr, "HTTP server starting");

        let task = tokio::spawn(accept_loop(
            listener,
            self.router,
            self.tracker.clone(),
            stop.clone(),
            serve_errors,
        ));

        ServerHandle {
            local_addr,
            stop,
            tracker: self.tracker,
            task,
        }
    }
}

/// Handle to a running server, owned by whoever controls its lifetime.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    stop: ShutdownGate,
    tracker: ConnectionTracker,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Connections currently open.
    pub fn open_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Stop accepting and wait for open connections to finish until `deadline`.
    ///
    /// Connections still open at the deadline are closed forcibly and the
    /// drain is reported as timed out.
    pub async fn shutdown(mut self, deadline: ShutdownDeadline) -> Result<(), LifecycleError> {
        if !self.stop.fire() {
            tracing::debug!("Listener stop already requested");
        }

        match tokio::time::timeout_at(deadline.instant(), &mut self.task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LifecycleError::Shutdown(e)),
            Err(_) => {
                let open_connections = self.tracker.active_count();
                tracing::warn!(
                    open_connections,
                    grace_period_ms = deadline.grace().as_millis() as u64,
                    "Grace period elapsed, closing remaining connections"
                );
                self.task.abort();
                // Aborting drops the connection set, which aborts every connection task.
                let _ = (&mut self.task).await;
                Err(LifecycleError::DrainTimeout {
                    grace: deadline.grace(),
                    open_connections,
                })
            }
        }
    }
}

async fn accept_loop(
    listener: Listener,
    router: Router,
    tracker: ConnectionTracker,
    stop: ShutdownGate,
    serve_errors: mpsc::UnboundedSender<LifecycleError>,
) {
    let mut connections = JoinSet::new();
    let mut backoff = MIN_ACCEPT_BACKOFF;

    loop {
        tokio::select! {
            biased;

            _ = stop.fired() => break,

            Some(finished) = connections.join_next() => log_connection_exit(finished),

            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr, permit)) => {
                    backoff = MIN_ACCEPT_BACKOFF;
                    let guard = tracker.track();
                    connections.spawn(serve_connection(
                        stream,
                        peer_addr,
                        permit,
                        guard,
                        router.clone(),
                        stop.clone(),
                    ));
                }
                Err(e) if !is_reportable(&e) => {
                    tracing::debug!(error = %e, "Connection dropped during accept");
                }
                Err(e) => {
                    metrics::record_serve_error();
                    let _ = serve_errors.send(LifecycleError::Serve(e));
                    tokio::select! {
                        _ = stop.fired() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = next_backoff(backoff);
                }
            },
        }
    }

    // Closing the socket makes the OS refuse any further dial.
    drop(listener);
    tracing::info!(
        open_connections = tracker.active_count(),
        "Stopped accepting connections"
    );

    while let Some(finished) = connections.join_next().await {
        log_connection_exit(finished);
    }
    tracing::info!("All connections closed");
}

/// Whether an accept failure concerns the listener rather than one peer.
fn is_reportable(error: &ListenerError) -> bool {
    match error {
        ListenerError::Accept(e) => !is_connection_error(e),
        _ => true,
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_ACCEPT_BACKOFF)
}

async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    _permit: ConnectionPermit,
    guard: ConnectionGuard,
    router: Router,
    stop: ShutdownGate,
) {
    let connection_id = guard.id();
    let builder = Builder::new(TokioExecutor::new());
    let connection =
        builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(router));
    tokio::pin!(connection);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        _ = stop.fired() => {
            tracing::debug!(connection_id = %connection_id, "Draining connection");
            // Idle connections close now; a request in progress finishes first.
            connection.as_mut().graceful_shutdown();
            connection.await
        }
    };

    if let Err(e) = result {
        tracing::debug!(
            connection_id = %connection_id,
            peer_addr = %peer_addr,
            error = %e,
            "Connection closed with error"
        );
    }
}

fn log_connection_exit(finished: Result<(), JoinError>) {
    if let Err(e) = finished {
        if e.is_panic() {
            tracing::error!(error = %e, "Connection task panicked");
        }
    }
}
