//! Play command - replay a primary flight with traffic.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use skyreplay::igc::IgcSource;
use skyreplay::replay::{spawn_replay_driver, ReplayError, ReplaySnapshot, SharedReplay};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::CliError;
use crate::runner::CliRunner;

/// How often a status block is printed.
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Arguments for the play command.
pub struct PlayArgs {
    pub primary: PathBuf,
    pub traffic: Vec<PathBuf>,
    pub speed: Option<f64>,
    pub fast_forward: Option<f64>,
    pub duration: Option<u64>,
    pub config: Option<PathBuf>,
    pub debug: bool,
}

/// Run the play command.
pub fn run(args: PlayArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref(), args.debug)?;
    runner.log_startup("play");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(play(&runner, args))
}

async fn play(runner: &CliRunner, args: PlayArgs) -> Result<(), CliError> {
    let config = runner.config().clone();
    let tick_interval = config.tick_interval;
    let replay = SharedReplay::with_config(Arc::new(IgcSource), config);

    println!("SkyReplay v{}", skyreplay::VERSION);
    println!("================");
    println!();

    let reference = replay.start(&args.primary).await?;
    println!("Reference: {} ({})", reference, args.primary.display());

    for path in &args.traffic {
        match replay.add_track(path).await {
            Ok(name) => println!("Traffic:   {} ({})", name, path.display()),
            Err(e) if e.is_open_failure() || matches!(e, ReplayError::DuplicateName(_)) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping traffic file");
                eprintln!("Skipping {}: {}", path.display(), e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(speed) = args.speed {
        replay.set_time_scale(speed)?;
    }
    if let Some(delta) = args.fast_forward {
        if !replay.fast_forward(delta) {
            return Err(CliError::InvalidArgument(format!(
                "--fast-forward must be a positive number of seconds, got {}",
                delta
            )));
        }
    }
    println!();

    let cancellation = CancellationToken::new();
    let driver = spawn_replay_driver(replay.clone(), cancellation.clone(), tick_interval);

    let deadline = args
        .duration
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let until_deadline = async move {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(until_deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut report = tokio::time::interval(REPORT_INTERVAL);
    loop {
        tokio::select! {
            _ = report.tick() => {
                let snapshot = replay.snapshot();
                print_status(&snapshot);
                if snapshot.all_exhausted() {
                    println!("All tracks finished.");
                    break;
                }
            }
            _ = &mut until_deadline => {
                println!("Duration elapsed.");
                break;
            }
            _ = &mut ctrl_c => {
                println!();
                println!("Interrupted.");
                break;
            }
        }
    }

    cancellation.cancel();
    if let Err(e) = driver.await {
        tracing::warn!(error = %e, "Replay driver ended abnormally");
    }
    replay.stop();

    Ok(())
}

fn print_status(snapshot: &ReplaySnapshot) {
    let clock = snapshot
        .virtual_time
        .map(format_clock)
        .unwrap_or_else(|| "--:--:--".to_string());
    println!("[{}] x{:.1} {}", clock, snapshot.time_scale, snapshot.state);

    for track in &snapshot.tracks {
        let marker = if track.is_reference { '*' } else { ' ' };
        match &track.sample {
            Some(sample) => println!(
                " {} {:<12} {:>9.5} {:>10.5} {:>6.0}m{}",
                marker,
                track.name,
                sample.location.latitude,
                sample.location.longitude,
                sample.altitude,
                if track.exhausted { "  (ended)" } else { "" }
            ),
            None => println!(" {} {:<12} waiting", marker, track.name),
        }
    }
}

/// Format seconds since UTC midnight as `HH:MM:SS`.
fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = (total / 3600) % 24;
    let minutes = (total / 60) % 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
