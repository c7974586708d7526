//! Multi-track flight replay.
//!
//! Replays recorded flight tracks against one shared virtual clock so that
//! several pilots' flights can be watched together, as if live.
//!
//! # Architecture
//!
//! - A **reference track** seeds the virtual clock from its first fix.
//! - Every other track follows the virtual clock, whatever its own first
//!   timestamp is. A track added mid-replay joins at the current time.
//! - Each tick advances the clock by `elapsed * time_scale` and asks every
//!   track for an interpolated sample at the new time.
//! - Each track keeps a bounded trace of its recent samples for drawing
//!   trails.
//!
//! Positions between recorded fixes come from Catmull-Rom interpolation over
//! a sliding window of four fixes, so a display polling far faster than the
//! logger recorded still sees smooth motion.
//!
//! # Usage
//!
//! ```ignore
//! use skyreplay::igc::IgcSource;
//! use skyreplay::replay::{spawn_replay_driver, SharedReplay, DEFAULT_TICK_INTERVAL};
//!
//! let replay = SharedReplay::with_config(Arc::new(IgcSource), config);
//! replay.start("lead.igc").await?;
//! replay.add_track("wingman.igc").await?;
//!
//! let driver = spawn_replay_driver(replay.clone(), cancellation.clone(), DEFAULT_TICK_INTERVAL);
//!
//! for index in 0..replay.track_count() {
//!     if let Some(sample) = replay.sample(index) {
//!         println!("{}: {:.0}m", sample.label, sample.altitude);
//!     }
//! }
//! ```
//!
//! # Components
//!
//! - [`fix`] - `Fix`, `Sample`, `GeoPoint` and the `FixSource` decoder trait
//! - [`interpolator`] - Catmull-Rom sampling between fixes
//! - [`trace`] - Bounded history of emitted samples
//! - [`track`] - One replayed source with its cursor and trace
//! - [`engine`] - `ReplayEngine` owning the clock and every track
//! - [`shared`] - `SharedReplay`, the thread-safe handle with snapshot publishing
//! - [`driver`] - Background tick task

mod driver;
mod engine;
mod error;
pub mod fix;
pub mod interpolator;
mod shared;
mod snapshot;
pub mod trace;
mod track;

pub use driver::{spawn_replay_driver, DEFAULT_TICK_INTERVAL};
pub use engine::ReplayEngine;
pub use error::{ReplayError, SourceError};
pub use fix::{Fix, FixSource, GeoPoint, Recording, Sample};
pub use shared::SharedReplay;
pub use snapshot::{ReplaySnapshot, ReplayState, TrackSnapshot, TrafficSample};
pub use trace::{Trace, DEFAULT_TRACE_CAPACITY};
pub use track::{Track, TrackOpener};
