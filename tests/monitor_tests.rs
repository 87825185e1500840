//! Integration tests for the polling/control core, driven against an
//! in-process scripted stand-in for the simulation backend.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aura_monitor::config::MonitorConfig;
use aura_monitor::domain::{StartParams, Status};
use aura_monitor::monitor::Monitor;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

const POLL_MS: u64 = 20;

// ==============================================================================
// mock backend
// ==============================================================================

/// Scripted simulation backend. GET /status serves the scripted snapshots in
/// order (the last one repeats); POST /{command} records the command and its
/// payload. Every request lands in `log` in arrival order.
struct MockBackend {
    script: Mutex<Vec<Status>>,
    status_calls: AtomicUsize,
    /// status call index from which /status answers 500
    fail_after: AtomicUsize,
    /// when set, every command endpoint answers 500
    fail_commands: AtomicBool,
    log: Mutex<Vec<String>>,
    payloads: Mutex<Vec<(String, Value)>>,
}

impl MockBackend {
    fn new(script: Vec<Status>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            status_calls: AtomicUsize::new(0),
            fail_after: AtomicUsize::new(usize::MAX),
            fail_commands: AtomicBool::new(false),
            log: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
        })
    }

    async fn serve(self: &Arc<Self>) -> SocketAddr {
        let app = Router::new()
            .route("/status", get(status_handler))
            .route("/:command", post(command_handler))
            .with_state(Arc::clone(self));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn push_log(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn log_snapshot(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn request_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

async fn status_handler(State(backend): State<Arc<MockBackend>>) -> Response {
    backend.push_log("GET /status".to_string());
    let n = backend.status_calls.fetch_add(1, Ordering::SeqCst);
    if n >= backend.fail_after.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let script = backend.script.lock().unwrap();
    let status = script
        .get(n)
        .or_else(|| script.last())
        .cloned()
        .unwrap_or_default();
    Json(status).into_response()
}

async fn command_handler(
    Path(command): Path<String>,
    State(backend): State<Arc<MockBackend>>,
    Json(payload): Json<Value>,
) -> Response {
    backend.push_log(format!("POST /{command}"));
    backend.payloads.lock().unwrap().push((command, payload));
    if backend.fail_commands.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    StatusCode::OK.into_response()
}

// ==============================================================================
// helpers
// ==============================================================================

fn test_config(addr: SocketAddr) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.backend.base_url = format!("http://{addr}");
    config.polling.interval_ms = POLL_MS;
    config
}

fn running(timestep: u64) -> Status {
    Status {
        is_running: true,
        timestep,
        fidelity: 0.97,
        power_saved_percent: 40.0,
        ..Status::default()
    }
}

fn idle() -> Status {
    Status::default()
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}

// ==============================================================================
// tests
// ==============================================================================

#[tokio::test]
async fn initial_fetch_with_idle_simulation_arms_no_loop() {
    let backend = MockBackend::new(vec![idle()]);
    let addr = backend.serve().await;

    let monitor = Monitor::connect(&test_config(addr)).await;

    let snapshot = monitor.snapshot().expect("initial fetch should populate the snapshot");
    assert!(!snapshot.is_running);
    assert!(!monitor.is_polling());
    assert!(monitor.history().is_empty());

    // no further automatic polls
    tokio::time::sleep(Duration::from_millis(POLL_MS * 10)).await;
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn initial_fetch_failure_leaves_monitor_unconnected() {
    let backend = MockBackend::new(vec![running(1)]);
    backend.fail_after.store(0, Ordering::SeqCst);
    let addr = backend.serve().await;

    let monitor = Monitor::connect(&test_config(addr)).await;

    // "not yet connected" is distinct from idle: no snapshot at all
    assert!(monitor.snapshot().is_none());
    assert!(!monitor.is_polling());
    assert!(monitor.history().is_empty());
}

#[tokio::test]
async fn running_polls_accumulate_chart_history() {
    let backend = MockBackend::new(vec![
        running(1),
        running(2),
        running(3),
        running(4),
        idle(),
    ]);
    let addr = backend.serve().await;

    let monitor = Monitor::connect(&test_config(addr)).await;
    assert!(monitor.is_polling());

    // the loop drains the script and stops itself on the idle snapshot
    wait_until(|| !monitor.is_polling()).await;

    let points = monitor.history();
    let timesteps: Vec<u64> = points.iter().map(|p| p.timestep).collect();
    assert_eq!(timesteps, vec![1, 2, 3, 4]);
    assert_eq!(points[0].fidelity, 0.97);
    assert_eq!(points[0].power_saved, 0.4);

    // the idle snapshot replaced the mirror but added no point
    let snapshot = monitor.snapshot().unwrap();
    assert!(!snapshot.is_running);
}

#[tokio::test]
async fn failed_poll_halts_loop_and_leaves_mirror_stale() {
    let backend = MockBackend::new(vec![running(1), running(2)]);
    backend.fail_after.store(2, Ordering::SeqCst);
    let addr = backend.serve().await;

    let monitor = Monitor::connect(&test_config(addr)).await;
    wait_until(|| !monitor.is_polling()).await;

    // the failure strands the run state at its last known value
    let snapshot = monitor.snapshot().unwrap();
    assert!(snapshot.is_running);
    assert_eq!(snapshot.timestep, 2);
    let timesteps: Vec<u64> = monitor.history().iter().map(|p| p.timestep).collect();
    assert_eq!(timesteps, vec![1, 2]);

    // no automatic retry after the halt
    let before = backend.request_count();
    tokio::time::sleep(Duration::from_millis(POLL_MS * 10)).await;
    assert_eq!(backend.request_count(), before);

    // a later explicit refresh that sees a running snapshot re-arms the loop
    backend.fail_after.store(usize::MAX, Ordering::SeqCst);
    monitor.refresh().await;
    assert!(monitor.is_polling());
}

#[tokio::test]
async fn command_refresh_is_ordered_after_the_write() {
    let backend = MockBackend::new(vec![idle()]);
    let addr = backend.serve().await;

    let monitor = Monitor::connect(&test_config(addr)).await;
    assert_eq!(backend.log_snapshot(), vec!["GET /status"]);

    monitor.start(&StartParams::default()).await;
    assert_eq!(
        backend.log_snapshot(),
        vec!["GET /status", "POST /start", "GET /status"]
    );

    let payloads = backend.payloads.lock().unwrap().clone();
    let (command, payload) = &payloads[0];
    assert_eq!(command, "start");
    assert_eq!(payload["threshold"], json!(0.98));
    assert_eq!(payload["duration"], json!(40));
    assert_eq!(payload["n_way_comparison"], json!(2));
    assert_eq!(payload["collection_period"], json!(200));
}

#[tokio::test]
async fn pause_sends_an_empty_payload() {
    let backend = MockBackend::new(vec![idle()]);
    let addr = backend.serve().await;

    let monitor = Monitor::connect(&test_config(addr)).await;
    monitor.pause().await;

    let payloads = backend.payloads.lock().unwrap().clone();
    let (command, payload) = &payloads[0];
    assert_eq!(command, "pause");
    assert_eq!(*payload, json!({}));
}

#[tokio::test]
async fn failed_write_still_triggers_the_refresh() {
    let backend = MockBackend::new(vec![idle()]);
    backend.fail_commands.store(true, Ordering::SeqCst);
    let addr = backend.serve().await;

    let monitor = Monitor::connect(&test_config(addr)).await;
    monitor.reset().await;

    // the write failed, the follow-up refresh still ran, nothing surfaced
    assert_eq!(
        backend.log_snapshot(),
        vec!["GET /status", "POST /reset", "GET /status"]
    );
    assert!(monitor.snapshot().is_some());
}

#[tokio::test]
async fn dropping_the_monitor_stops_polling() {
    let backend = MockBackend::new(vec![running(1)]);
    let addr = backend.serve().await;

    let monitor = Monitor::connect(&test_config(addr)).await;
    wait_until(|| backend.request_count() >= 3).await;

    drop(monitor);

    // let any in-flight request drain, then expect silence
    tokio::time::sleep(Duration::from_millis(POLL_MS * 3)).await;
    let settled = backend.request_count();
    tokio::time::sleep(Duration::from_millis(POLL_MS * 10)).await;
    assert_eq!(backend.request_count(), settled);
}

#[tokio::test]
async fn clearing_history_empties_the_chart() {
    let backend = MockBackend::new(vec![running(1), idle()]);
    let addr = backend.serve().await;

    let monitor = Monitor::connect(&test_config(addr)).await;
    wait_until(|| !monitor.is_polling()).await;
    assert_eq!(monitor.history().len(), 1);

    monitor.clear_history();
    assert!(monitor.history().is_empty());
}
