//! Read-only copies of replay state for renderers.
//!
//! A [`ReplaySnapshot`] is taken under the engine's serialization point and
//! never changes afterwards, so it can be handed to any thread.

use std::path::PathBuf;

use super::fix::{GeoPoint, Sample};

/// Lifecycle state of the replay engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayState {
    /// No reference track; the virtual clock is undefined.
    #[default]
    Idle,
    /// Virtual time advances with wall-clock time times the time scale.
    Active,
    /// Racing to a target virtual time without wall-clock pacing.
    FastForwarding,
}

impl std::fmt::Display for ReplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Active => write!(f, "Active"),
            Self::FastForwarding => write!(f, "Fast-forwarding"),
        }
    }
}

/// Current position of one track, as drawn on a map.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSample {
    pub label: String,
    pub location: GeoPoint,
    /// Altitude MSL in meters.
    pub altitude: f64,
    /// Virtual time of the sample.
    pub time: f64,
}

/// Copy of one track's replay state.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSnapshot {
    pub name: String,
    pub path: PathBuf,
    /// Last emitted sample; `None` while the engine has no clock.
    pub sample: Option<Sample>,
    /// Past samples, oldest first.
    pub trace: Vec<Sample>,
    pub exhausted: bool,
    pub is_reference: bool,
}

impl TrackSnapshot {
    pub fn traffic_sample(&self) -> Option<TrafficSample> {
        self.sample.as_ref().map(|sample| TrafficSample {
            label: self.name.clone(),
            location: sample.location,
            altitude: sample.altitude,
            time: sample.time,
        })
    }
}

/// Copy of the whole replay state.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySnapshot {
    pub state: ReplayState,
    pub virtual_time: Option<f64>,
    pub time_scale: f64,
    pub fast_forward_target: Option<f64>,
    pub reference: Option<String>,
    pub tracks: Vec<TrackSnapshot>,
}

impl ReplaySnapshot {
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn sample(&self, index: usize) -> Option<TrafficSample> {
        self.tracks.get(index)?.traffic_sample()
    }

    pub fn trace(&self, index: usize) -> Option<&[Sample]> {
        self.tracks.get(index).map(|track| track.trace.as_slice())
    }

    pub fn track(&self, name: &str) -> Option<&TrackSnapshot> {
        self.tracks.iter().find(|track| track.name == name)
    }

    /// True when there is at least one track and all of them are exhausted.
    pub fn all_exhausted(&self) -> bool {
        !self.tracks.is_empty() && self.tracks.iter().all(|track| track.exhausted)
    }
}
