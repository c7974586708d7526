//! SkyReplay - synchronised replay of recorded flight tracks.
//!
//! Loads several recorded flights (IGC logs) and plays them back together
//! against one virtual clock, producing smoothly interpolated positions and
//! bounded trails for every track.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use skyreplay::config::ReplayConfig;
//! use skyreplay::igc::IgcSource;
//! use skyreplay::replay::SharedReplay;
//!
//! let replay = SharedReplay::with_config(Arc::new(IgcSource), ReplayConfig::load()?);
//! replay.start("lead.igc").await?;
//! replay.add_track("wingman.igc").await?;
//! replay.set_time_scale(4.0)?;
//! ```

pub mod config;
pub mod igc;
pub mod logging;
pub mod replay;

/// Version of the SkyReplay library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
