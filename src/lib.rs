//! ==============================================================================
//! aura-monitor - monitoring client for the AURA power-saving simulation
//! ==============================================================================
//!
//! purpose:
//!     maintains an eventually-consistent local mirror of a remote simulation
//!     backend over its REST API: the latest status snapshot, a bounded chart
//!     history, and start/pause/reset control with an immediate follow-up
//!     refresh after every command.
//!
//! layout:
//!     - domain:  wire schema for the backend contract + derived chart types
//!     - config:  TOML configuration (config/monitor.toml)
//!     - client:  HTTP wrapper over the backend endpoints
//!     - history: bounded FIFO chart buffer
//!     - monitor: poll-loop + command controller handed to the view layer
//!
//! the simulation itself (sensor state machine, learner, retraining) lives in
//! the backend service; this crate only observes and steers it.
//!
//! ==============================================================================

pub mod client;
pub mod config;
pub mod domain;
pub mod history;
pub mod monitor;

pub use client::{ApiClient, ApiError};
pub use config::MonitorConfig;
pub use domain::{ChartPoint, LearnerStatus, Phase, Sensor, StartParams, Status};
pub use history::ChartHistory;
pub use monitor::Monitor;
