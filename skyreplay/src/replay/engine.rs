//! Replay engine - owns the virtual clock and every replayed track.
//!
//! # State machine
//!
//! ```text
//!            start            fast_forward
//!   Idle ──────────► Active ◄──────────────► FastForwarding
//!    ▲                 │     (target reached)        │
//!    └─────────────────┴─────────────────────────────┘
//!          stop / last track removed
//! ```
//!
//! The reference track seeds the virtual clock from its first fix. Every
//! other track follows that clock: a track added mid-replay starts at the
//! current virtual time, not at its own first fix.
//!
//! # Scheduling
//!
//! The host calls [`ReplayEngine::tick`] periodically with the wall-clock
//! time elapsed since the previous tick. The engine scales it by the time
//! scale, advances the virtual clock and asks every track for its sample at
//! the new time. `tick` never blocks and never fails.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::error::ReplayError;
use super::fix::{FixSource, Sample};
use super::snapshot::{ReplaySnapshot, ReplayState, TrackSnapshot, TrafficSample};
use super::track::{Track, TrackOpener};
use crate::config::{ReplayConfig, DEFAULT_FAST_FORWARD_MAX_STEPS, DEFAULT_FAST_FORWARD_STEP};

/// Synchronised replay of any number of recorded tracks.
pub struct ReplayEngine {
    opener: TrackOpener,
    config: ReplayConfig,
    /// Unique by name. Insertion order is kept for index-based access.
    tracks: Vec<Track>,
    /// Name of the track whose clock seeds the virtual time.
    reference: Option<String>,
    virtual_time: Option<f64>,
    time_scale: f64,
    fast_forward_target: Option<f64>,
}

impl ReplayEngine {
    /// Create an idle engine with default configuration.
    pub fn new(source: Arc<dyn FixSource>) -> Self {
        Self::with_config(source, ReplayConfig::default())
    }

    /// Create an idle engine with custom configuration.
    pub fn with_config(source: Arc<dyn FixSource>, mut config: ReplayConfig) -> Self {
        let time_scale = if config.time_scale.is_finite() && config.time_scale >= 0.0 {
            config.time_scale
        } else {
            1.0
        };
        // Fast-forward must move the clock forward and terminate.
        if !config.fast_forward_step.is_finite() || config.fast_forward_step <= 0.0 {
            tracing::warn!(
                step = config.fast_forward_step,
                "Invalid fast-forward step, using default"
            );
            config.fast_forward_step = DEFAULT_FAST_FORWARD_STEP;
        }
        if config.fast_forward_max_steps == 0 {
            config.fast_forward_max_steps = DEFAULT_FAST_FORWARD_MAX_STEPS;
        }

        Self {
            opener: TrackOpener::new(source, config.trace_capacity),
            config,
            tracks: Vec::new(),
            reference: None,
            virtual_time: None,
            time_scale,
            fast_forward_target: None,
        }
    }

    /// Handle for opening tracks without holding the engine.
    pub fn opener(&self) -> TrackOpener {
        self.opener.clone()
    }

    pub fn state(&self) -> ReplayState {
        match (&self.reference, self.fast_forward_target) {
            (None, _) => ReplayState::Idle,
            (Some(_), Some(_)) => ReplayState::FastForwarding,
            (Some(_), None) => ReplayState::Active,
        }
    }

    // ------------------------------------------------------------------
    // Control surface
    // ------------------------------------------------------------------

    /// Open `path` as the reference track and start the virtual clock.
    ///
    /// Returns the name of the new reference track. If the engine is already
    /// running, playback restarts with the new reference once the source has
    /// been opened successfully; on failure the running replay is untouched.
    pub fn start(&mut self, path: &Path) -> Result<String, ReplayError> {
        let track = self.opener.open(path)?;
        self.start_with(track)
    }

    /// Start the virtual clock with an already opened reference track.
    ///
    /// Tracks staged while idle are kept and synchronised to the new clock.
    pub fn start_with(&mut self, mut track: Track) -> Result<String, ReplayError> {
        if self.state() != ReplayState::Idle {
            self.stop();
        }
        if self.contains(track.name()) {
            return Err(ReplayError::DuplicateName(track.name().to_string()));
        }

        let start_time = track.first_fix_time();
        track.advance_to(start_time);
        let name = track.name().to_string();

        tracing::info!(
            reference = %name,
            start_time,
            staged = self.tracks.len(),
            time_scale = self.time_scale,
            "Replay started"
        );

        self.tracks.insert(0, track);
        self.reference = Some(name.clone());
        self.virtual_time = Some(start_time);
        self.fast_forward_target = None;
        self.advance_all(start_time);

        Ok(name)
    }

    /// Open `path` and add it as an additional track.
    ///
    /// Returns the name of the new track.
    pub fn add_track(&mut self, path: &Path) -> Result<String, ReplayError> {
        let track = self.opener.open(path)?;
        self.insert_track(track)
    }

    /// Add an already opened track.
    ///
    /// While the clock runs, the track is advanced to the current virtual
    /// time straight away. While idle it is staged until [`start`](Self::start).
    pub fn insert_track(&mut self, mut track: Track) -> Result<String, ReplayError> {
        if self.contains(track.name()) {
            return Err(ReplayError::DuplicateName(track.name().to_string()));
        }

        if let Some(now) = self.virtual_time {
            track.advance_to(now);
        }
        let name = track.name().to_string();

        tracing::info!(
            track = %name,
            state = %self.state(),
            virtual_time = ?self.virtual_time,
            "Track added"
        );

        self.tracks.push(track);
        Ok(name)
    }

    /// Remove a track and discard its trace.
    ///
    /// Removing the reference track promotes the remaining track with the
    /// earliest next unread fix (first in insertion order on a tie).
    /// Removing the last track returns the engine to idle.
    pub fn remove_track(&mut self, name: &str) -> Result<(), ReplayError> {
        let index = self
            .index_of(name)
            .ok_or_else(|| ReplayError::UnknownTrack(name.to_string()))?;
        self.tracks.remove(index);

        tracing::info!(track = %name, remaining = self.tracks.len(), "Track removed");

        if self.tracks.is_empty() {
            self.reset_clock();
            tracing::info!("Last track removed, replay idle");
            return Ok(());
        }

        if self.reference.as_deref() == Some(name) {
            self.reference = self.promotion_candidate();
            if let Some(promoted) = &self.reference {
                tracing::info!(reference = %promoted, "Reference track promoted");
            }
        }

        Ok(())
    }

    /// Set the playback rate. Zero pauses the clock without stopping.
    pub fn set_time_scale(&mut self, scale: f64) -> Result<(), ReplayError> {
        if !scale.is_finite() || scale < 0.0 {
            return Err(ReplayError::InvalidScale(scale));
        }

        tracing::info!(time_scale = scale, "Time scale changed");
        self.time_scale = scale;
        Ok(())
    }

    /// Race `delta` seconds of virtual time ahead without wall-clock pacing.
    ///
    /// Only valid while [`ReplayState::Active`]. Returns false and changes
    /// nothing otherwise, or if `delta` is not a positive finite number.
    pub fn fast_forward(&mut self, delta: f64) -> bool {
        if self.state() != ReplayState::Active || !delta.is_finite() || delta <= 0.0 {
            return false;
        }
        let Some(now) = self.virtual_time else {
            return false;
        };

        let target = now + delta;
        tracing::info!(from = now, target, "Fast-forward started");
        self.fast_forward_target = Some(target);
        true
    }

    /// Advance the replay by `elapsed` wall-clock time.
    ///
    /// While fast-forwarding, `elapsed` and the time scale are ignored and
    /// the clock steps towards the target instead.
    pub fn tick(&mut self, elapsed: Duration) {
        let Some(now) = self.virtual_time else {
            return;
        };

        match self.fast_forward_target {
            Some(target) => self.step_fast_forward(now, target),
            None => {
                let next = now + elapsed.as_secs_f64() * self.time_scale;
                if next > now {
                    self.virtual_time = Some(next);
                    self.advance_all(next);
                }
            }
        }

        tracing::trace!(virtual_time = ?self.virtual_time, "Replay tick");
    }

    /// Discard every track and return to idle. Idempotent.
    pub fn stop(&mut self) {
        if self.tracks.is_empty() && self.reference.is_none() {
            return;
        }

        tracing::info!(tracks = self.tracks.len(), "Replay stopped");
        self.tracks.clear();
        self.reset_clock();
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn virtual_time(&self) -> Option<f64> {
        self.virtual_time
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn fast_forward_target(&self) -> Option<f64> {
        self.fast_forward_target
    }

    /// Name of the reference track.
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.tracks.iter().position(|track| track.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Current position and label of the track at `index`.
    pub fn sample(&self, index: usize) -> Option<TrafficSample> {
        let track = self.tracks.get(index)?;
        track.last_sample().map(|sample| TrafficSample {
            label: track.name().to_string(),
            location: sample.location,
            altitude: sample.altitude,
            time: sample.time,
        })
    }

    /// Copy of the trace of the track at `index`, oldest first.
    pub fn trace(&self, index: usize) -> Option<Vec<Sample>> {
        self.tracks.get(index).map(|track| track.trace().to_vec())
    }

    /// True when there is at least one track and all of them are exhausted.
    pub fn all_exhausted(&self) -> bool {
        !self.tracks.is_empty() && self.tracks.iter().all(Track::is_exhausted)
    }

    /// Immutable copy of the full replay state.
    pub fn snapshot(&self) -> ReplaySnapshot {
        ReplaySnapshot {
            state: self.state(),
            virtual_time: self.virtual_time,
            time_scale: self.time_scale,
            fast_forward_target: self.fast_forward_target,
            reference: self.reference.clone(),
            tracks: self
                .tracks
                .iter()
                .map(|track| TrackSnapshot {
                    name: track.name().to_string(),
                    path: track.path().to_path_buf(),
                    sample: track.last_sample().cloned(),
                    trace: track.trace().to_vec(),
                    exhausted: track.is_exhausted(),
                    is_reference: self.reference.as_deref() == Some(track.name()),
                })
                .collect(),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn advance_all(&mut self, time: f64) {
        for track in &mut self.tracks {
            track.advance_to(time);
        }
    }

    /// Step towards the fast-forward target within the per-tick budget.
    fn step_fast_forward(&mut self, mut now: f64, target: f64) {
        let step = self.config.fast_forward_step;
        let mut steps = 0;

        while now < target && steps < self.config.fast_forward_max_steps {
            now = (now + step).min(target);
            self.advance_all(now);
            steps += 1;
        }
        self.virtual_time = Some(now);

        if now >= target {
            self.fast_forward_target = None;
            tracing::info!(virtual_time = now, steps, "Fast-forward complete");
        }
    }

    fn promotion_candidate(&self) -> Option<String> {
        self.tracks
            .iter()
            .min_by(|a, b| {
                let a = a.next_fix_time().unwrap_or(f64::INFINITY);
                let b = b.next_fix_time().unwrap_or(f64::INFINITY);
                a.total_cmp(&b)
            })
            .map(|track| track.name().to_string())
    }

    fn reset_clock(&mut self) {
        self.reference = None;
        self.virtual_time = None;
        self.fast_forward_target = None;
    }
}

impl std::fmt::Debug for ReplayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayEngine")
            .field("state", &self.state())
            .field("reference", &self.reference)
            .field("virtual_time", &self.virtual_time)
            .field("time_scale", &self.time_scale)
            .field("fast_forward_target", &self.fast_forward_target)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}
