//! SkyReplay CLI - play recorded flights together on one clock.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::play::PlayArgs;

#[derive(Parser)]
#[command(name = "skyreplay")]
#[command(version = skyreplay::VERSION)]
#[command(about = "Replay recorded flight logs side by side", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a primary flight with optional traffic flights
    Play {
        /// IGC file whose clock drives the replay
        primary: PathBuf,

        /// Additional IGC files replayed as traffic (repeatable)
        #[arg(long = "traffic", short = 't')]
        traffic: Vec<PathBuf>,

        /// Playback speed multiplier (0 pauses)
        #[arg(long, short = 's')]
        speed: Option<f64>,

        /// Skip this many seconds ahead right after starting
        #[arg(long = "fast-forward", value_name = "SECS")]
        fast_forward: Option<f64>,

        /// Stop after this many wall-clock seconds
        #[arg(long, value_name = "SECS")]
        duration: Option<u64>,

        /// Config file (default: ~/.skyreplay/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable debug logging to stdout
        #[arg(long)]
        debug: bool,
    },

    /// Show header information and fix counts of IGC files
    Info {
        /// IGC files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Only read header records
        #[arg(long)]
        headers: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            primary,
            traffic,
            speed,
            fast_forward,
            duration,
            config,
            debug,
        } => commands::play::run(PlayArgs {
            primary,
            traffic,
            speed,
            fast_forward,
            duration,
            config,
            debug,
        }),
        Commands::Info { files, headers } => commands::info::run(&files, headers),
    };

    if let Err(e) = result {
        e.exit();
    }
}
