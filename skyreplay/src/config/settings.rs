//! Configuration structs and their defaults.

use std::time::Duration;

use crate::replay::DEFAULT_TRACE_CAPACITY;

/// Default playback multiplier.
pub const DEFAULT_TIME_SCALE: f64 = 1.0;

/// Default driver tick period in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 250;

/// Default virtual-time step while fast-forwarding, in seconds.
pub const DEFAULT_FAST_FORWARD_STEP: f64 = 1.0;

/// Default number of fast-forward steps per tick.
pub const DEFAULT_FAST_FORWARD_MAX_STEPS: usize = 10_000;

/// Replay engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Maximum samples kept per track trace.
    pub trace_capacity: usize,
    /// Initial playback multiplier.
    pub time_scale: f64,
    /// Driver tick period.
    pub tick_interval: Duration,
    /// Virtual seconds advanced per fast-forward step.
    pub fast_forward_step: f64,
    /// Fast-forward steps allowed per tick before yielding.
    pub fast_forward_max_steps: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            trace_capacity: DEFAULT_TRACE_CAPACITY,
            time_scale: DEFAULT_TIME_SCALE,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            fast_forward_step: DEFAULT_FAST_FORWARD_STEP,
            fast_forward_max_steps: DEFAULT_FAST_FORWARD_MAX_STEPS,
        }
    }
}
