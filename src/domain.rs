//! ==============================================================================
//! domain.rs - backend wire schema and derived chart types
//! ==============================================================================
//!
//! purpose:
//!     serde types for the simulation backend's REST contract: the /status
//!     snapshot, its sensor list, and the /start parameter payload.
//!     ChartPoint is the client-side derivation used for time-series display.
//!
//! relationships:
//!     - produced by: client.rs (GET /status decoding)
//!     - consumed by: history.rs (point derivation), monitor.rs, main.rs
//!
//! ==============================================================================

use serde::{Deserialize, Serialize};

/// Full simulation status snapshot as served by GET /status.
///
/// The snapshot is replaced wholesale on every successful poll. Fields the
/// backend omits fall back to defaults so an older backend still decodes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub is_running: bool,
    pub timestep: u64,
    pub current_phase: Phase,
    pub active_sensors: u32,
    pub total_sensors: u32,
    /// percent of sensor power saved so far, 0-100
    pub power_saved_percent: f64,
    /// reconstruction fidelity, 0-1
    pub fidelity: f64,
    pub sensors: Vec<Sensor>,
    /// latest raw reading per sensor
    pub current_readings: Vec<f64>,

    // tuning and learner diagnostics; carried for display, never interpreted
    pub threshold: f64,
    pub duration: u64,
    pub n_way_comparison: u32,
    pub shadow_mode_probability: f64,
    pub learner_status: LearnerStatus,
    pub hybrid_fidelity_threshold: f64,
    pub hybrid_max_timesteps_since_retrain: u64,
    pub last_retrain_timestep: u64,
    pub collection_period: u64,
}

/// One simulated sensor node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sensor {
    pub id: u32,
    pub is_off: bool,
}

/// Simulation phase reported by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Collecting,
    ShadowOp,
    Finished,
}

/// Background learner state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnerStatus {
    #[default]
    Idle,
    Running,
}

/// One point of the chart time series, derived from a running snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestep: u64,
    /// fidelity as reported, 0-1
    pub fidelity: f64,
    /// power_saved_percent rescaled to 0-1
    pub power_saved: f64,
}

impl ChartPoint {
    pub fn from_status(status: &Status) -> Self {
        Self {
            timestep: status.timestep,
            fidelity: status.fidelity,
            power_saved: status.power_saved_percent / 100.0,
        }
    }
}

/// Tuning parameters posted to /start. The backend validates and interprets
/// them; this client only carries them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartParams {
    pub threshold: f64,
    pub duration: u64,
    pub n_way_comparison: u32,
    pub shadow_mode_probability: f64,
    pub hybrid_fidelity_threshold: f64,
    pub hybrid_max_timesteps_since_retrain: u64,
    pub collection_period: u64,
}

impl Default for StartParams {
    fn default() -> Self {
        Self {
            threshold: 0.98,
            duration: 40,
            n_way_comparison: 2,
            shadow_mode_probability: 0.05,
            hybrid_fidelity_threshold: 0.97,
            hybrid_max_timesteps_since_retrain: 2880,
            collection_period: 200,
        }
    }
}
