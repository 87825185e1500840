//! ==============================================================================
//! monitor.rs - status polling and simulation control
//! ==============================================================================
//!
//! purpose:
//!     Monitor keeps an eventually-consistent local mirror of the backend
//!     simulation (latest status snapshot + bounded chart history), runs the
//!     poll loop while the simulation reports running, and dispatches
//!     start/pause/reset commands with an unconditional follow-up refresh.
//!
//! lifecycle:
//!     one Monitor per attached view. at most one poll task is live at any
//!     time; a failed fetch or a not-running snapshot tears it down, and
//!     dropping the Monitor aborts it. a halted loop is only re-armed by a
//!     later refresh that observes is_running = true (typically the refresh
//!     that follows a user command) - there is no automatic retry.
//!
//! relationships:
//!     - uses: client.rs (HTTP), history.rs (chart buffer), domain.rs
//!     - used by: main.rs and the integration tests
//!
//! ==============================================================================

use crate::client::{ApiClient, ApiError};
use crate::config::MonitorConfig;
use crate::domain::{ChartPoint, StartParams, Status};
use crate::history::ChartHistory;

use serde_json::{json, Value};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// mirror of the backend state owned by one Monitor
struct Mirror {
    snapshot: Option<Status>,
    history: ChartHistory,
}

struct Inner {
    client: ApiClient,
    interval: Duration,
    mirror: RwLock<Mirror>,
    // at most one live poll task; never locked across an await
    poller: Mutex<Option<JoinHandle<()>>>,
}

/// Owns the status mirror and the poll loop for one attached view.
pub struct Monitor {
    inner: Arc<Inner>,
}

impl Monitor {
    /// Build the controller and perform the one initial status fetch.
    ///
    /// The initial fetch runs regardless of running state. When it fails the
    /// snapshot stays `None` ("not yet connected", distinct from idle) and no
    /// poll loop is armed.
    pub async fn connect(config: &MonitorConfig) -> Self {
        let inner = Arc::new(Inner {
            client: ApiClient::new(&config.backend.base_url),
            interval: Duration::from_millis(config.polling.interval_ms),
            mirror: RwLock::new(Mirror {
                snapshot: None,
                history: ChartHistory::with_capacity(config.charts.capacity),
            }),
            poller: Mutex::new(None),
        });
        let monitor = Self { inner };
        monitor.refresh().await;
        monitor
    }

    /// Latest successfully fetched snapshot; `None` until the first success.
    pub fn snapshot(&self) -> Option<Status> {
        self.inner.mirror.read().unwrap().snapshot.clone()
    }

    /// Chart history, oldest point first.
    pub fn history(&self) -> Vec<ChartPoint> {
        self.inner.mirror.read().unwrap().history.to_vec()
    }

    /// Drop all chart points. The view calls this when starting a fresh run
    /// or after a reset.
    pub fn clear_history(&self) {
        self.inner.mirror.write().unwrap().history.clear();
    }

    /// Whether a poll task is currently live.
    pub fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .unwrap()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Fetch the current status once and reconcile the poll loop: running
    /// arms it (idempotent), not running tears it down.
    ///
    /// On failure the snapshot and history are left untouched - the run state
    /// strands at its last known value - and polling halts.
    pub async fn refresh(&self) {
        match self.inner.fetch_and_apply().await {
            Ok(true) => self.ensure_polling(),
            Ok(false) => self.stop_polling(),
            Err(err) => {
                warn!(error = %err, "status fetch failed, polling halted");
                self.stop_polling();
            }
        }
    }

    /// Send a named command with a JSON payload, then refresh unconditionally.
    ///
    /// Write failures are logged and swallowed; the refresh still runs so the
    /// mirror reconciles with whatever the backend now reports. The refresh is
    /// strictly ordered after the write completes. Concurrent invocations are
    /// not serialized against each other.
    pub async fn send_command(&self, command: &str, payload: Value) {
        if let Err(err) = self.inner.client.post_command(command, &payload).await {
            warn!(command, error = %err, "command failed");
        }
        self.refresh().await;
    }

    /// POST /start with the full tuning-parameter set.
    pub async fn start(&self, params: &StartParams) {
        self.send_command("start", json!(params)).await;
    }

    /// POST /pause.
    pub async fn pause(&self) {
        self.send_command("pause", json!({})).await;
    }

    /// POST /reset.
    pub async fn reset(&self) {
        self.send_command("reset", json!({})).await;
    }

    // arm the poll loop if none is live. the slot may still hold the handle
    // of a loop that already exited on its own; that counts as absent.
    fn ensure_polling(&self) {
        let mut slot = self.inner.poller.lock().unwrap();
        if slot.as_ref().map(|handle| !handle.is_finished()).unwrap_or(false) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately and the caller just
            // fetched; consume it so the loop waits a full period
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match inner.fetch_and_apply().await {
                    Ok(true) => {}
                    Ok(false) => {
                        debug!("simulation no longer running, poll loop exiting");
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "status fetch failed, poll loop exiting");
                        break;
                    }
                }
            }
        }));
    }

    // safe to call with no loop live
    fn stop_polling(&self) {
        if let Some(handle) = self.inner.poller.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for Monitor {
    // the poll task holds its own Arc of the shared state; without the abort
    // it would keep polling after the owning view is gone
    fn drop(&mut self) {
        self.stop_polling();
    }
}

impl Inner {
    // one fetch-and-apply step shared by refresh() and the poll task. on
    // success the snapshot is replaced wholesale and the history fed; the
    // returned flag is the snapshot's is_running. on failure the mirror is
    // left untouched.
    async fn fetch_and_apply(&self) -> Result<bool, ApiError> {
        let status = self.client.fetch_status().await?;
        let running = status.is_running;
        let mut mirror = self.mirror.write().unwrap();
        mirror.history.record(&status);
        mirror.snapshot = Some(status);
        Ok(running)
    }
}
