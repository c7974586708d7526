//! Replay configuration.
//!
//! Settings live in `~/.skyreplay/config.ini`:
//!
//! ```ini
//! [replay]
//! trace_capacity = 300
//! time_scale = 1.0
//! tick_interval_ms = 250
//! fast_forward_step = 1.0
//! fast_forward_max_steps = 10000
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

mod file;
mod parser;
mod settings;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ReplayConfig, DEFAULT_FAST_FORWARD_MAX_STEPS, DEFAULT_FAST_FORWARD_STEP,
    DEFAULT_TICK_INTERVAL_MS, DEFAULT_TIME_SCALE,
};
