//! ==============================================================================
//! history.rs - bounded chart time series
//! ==============================================================================
//!
//! purpose:
//!     FIFO buffer of chart points capped at a fixed capacity. points are
//!     appended only from snapshots that report a running simulation and
//!     evicted oldest-first once the cap is exceeded; retained points are
//!     never reordered.
//!
//! relationships:
//!     - fed by: monitor.rs (one point per successful running poll)
//!     - read by: main.rs (chart rendering)
//!
//! ==============================================================================

use crate::domain::{ChartPoint, Status};
use std::collections::VecDeque;

/// Default number of retained chart points.
pub const DEFAULT_CAPACITY: usize = 300;

/// Bounded, order-preserving chart history.
#[derive(Clone, Debug)]
pub struct ChartHistory {
    points: VecDeque<ChartPoint>,
    capacity: usize,
}

impl Default for ChartHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ChartHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append the point derived from a snapshot. Snapshots that are not
    /// running leave the history untouched.
    pub fn record(&mut self, status: &Status) {
        if !status.is_running {
            return;
        }
        self.points.push_back(ChartPoint::from_status(status));
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently appended point.
    pub fn latest(&self) -> Option<&ChartPoint> {
        self.points.back()
    }

    /// Points oldest-first.
    pub fn points(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<ChartPoint> {
        self.points.iter().copied().collect()
    }
}
