//! Shared utilities for lifecycle integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use graceful_server::http::RESOURCE_PATH;
use graceful_server::lifecycle::RunningService;
use graceful_server::worker::slow::PROCESSED_MESSAGE;
use graceful_server::worker::{WorkError, WorkRequest, WorkResponse};
use graceful_server::{
    Coordinator, LifecycleError, LifecycleState, ServiceConfig, ShutdownGate, Worker,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Worker with a fixed delay that counts started and finished invocations.
#[derive(Clone)]
pub struct ScriptedWorker {
    delay: Duration,
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

impl ScriptedWorker {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Worker for ScriptedWorker {
    async fn handle(&self, _request: WorkRequest) -> Result<WorkResponse, WorkError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(WorkResponse::new(PROCESSED_MESSAGE))
    }
}

/// Config bound to an ephemeral loopback port.
pub fn config(grace: Duration) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.shutdown.grace_period_ms = grace.as_millis() as u64;
    config
}

/// A started service whose shutdown wait runs in the background.
pub struct Service {
    pub addr: SocketAddr,
    pub trigger: ShutdownGate,
    pub states: watch::Receiver<LifecycleState>,
    pub shutdown: JoinHandle<Result<(), LifecycleError>>,
}

pub async fn start(worker: ScriptedWorker, grace: Duration) -> Service {
    let coordinator = Coordinator::new(config(grace), worker);
    let running: RunningService = coordinator.start().await.expect("service should start");

    Service {
        addr: running.local_addr(),
        trigger: running.trigger(),
        states: running.subscribe_state(),
        shutdown: tokio::spawn(running.wait_for_shutdown()),
    }
}

/// Client that opens a fresh connection per request.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}

/// GET the resource, returning status and body.
pub async fn get_resource(addr: SocketAddr) -> reqwest::Result<(u16, String)> {
    let res = client()
        .get(format!("http://{}{}", addr, RESOURCE_PATH))
        .send()
        .await?;
    let status = res.status().as_u16();
    Ok((status, res.text().await?))
}

/// Poll `condition` until it holds, panicking after five seconds.
pub async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Wait until the service reports `state`.
pub async fn wait_for_state(states: &mut watch::Receiver<LifecycleState>, state: LifecycleState) {
    tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| *s == state))
        .await
        .expect("state not reached in time")
        .expect("coordinator dropped");
}
