//! CLI command implementations.
//!
//! - [`play`] - Replay one or more IGC files together
//! - [`info`] - Print IGC header information and fix counts

pub mod info;
pub mod play;
