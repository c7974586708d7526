//! Background task that advances a replay with wall-clock time.
//!
//! # Usage
//!
//! ```ignore
//! use skyreplay::replay::{spawn_replay_driver, SharedReplay, DEFAULT_TICK_INTERVAL};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancellation = CancellationToken::new();
//! let handle = spawn_replay_driver(replay.clone(), cancellation.clone(), DEFAULT_TICK_INTERVAL);
//! // ...
//! cancellation.cancel();
//! handle.await?;
//! ```

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::shared::SharedReplay;

/// Default tick period (4 Hz).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Spawns a task that ticks `replay` every `interval`.
///
/// Each tick passes the measured time since the previous one, so a late
/// tick does not slow the virtual clock down. The task stops when
/// `cancellation` is triggered; the replay itself is left as it is.
pub fn spawn_replay_driver(
    replay: SharedReplay,
    cancellation: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();

        tracing::debug!(interval_ms = interval.as_millis() as u64, "Replay driver started");

        loop {
            tokio::select! {
                now = ticker.tick() => {
                    replay.tick(now.saturating_duration_since(last));
                    last = now;
                }
                _ = cancellation.cancelled() => {
                    tracing::debug!("Replay driver stopped");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::engine::ReplayEngine;
    use crate::replay::error::SourceError;
    use crate::replay::fix::{Fix, FixSource, GeoPoint, Recording};
    use crate::replay::snapshot::ReplayState;
    use std::path::Path;
    use std::sync::Arc;

    struct HourSource;

    impl FixSource for HourSource {
        fn open(&self, _path: &Path) -> Result<Recording, SourceError> {
            let fixes = (0..3600)
                .map(|t| Fix::new(t as f64, GeoPoint::new(47.0, 11.0), 2000.0))
                .collect();
            Ok(Recording {
                label: Some("HB-1".to_string()),
                fixes,
            })
        }
    }

    fn running_replay(scale: f64) -> SharedReplay {
        let mut engine = ReplayEngine::new(Arc::new(HourSource));
        engine.start(Path::new("hb1.igc")).unwrap();
        engine.set_time_scale(scale).unwrap();
        SharedReplay::new(engine)
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_advances_clock() {
        let replay = running_replay(1.0);
        let cancellation = CancellationToken::new();
        let handle = spawn_replay_driver(
            replay.clone(),
            cancellation.clone(),
            Duration::from_millis(250),
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        cancellation.cancel();
        handle.await.unwrap();

        let now = replay.virtual_time().unwrap();
        assert!((1.75..=2.0).contains(&now), "virtual time {now}");
        assert_eq!(replay.state(), ReplayState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_applies_time_scale() {
        let replay = running_replay(10.0);
        let cancellation = CancellationToken::new();
        let handle = spawn_replay_driver(replay.clone(), cancellation.clone(), DEFAULT_TICK_INTERVAL);

        tokio::time::sleep(Duration::from_secs(3)).await;
        cancellation.cancel();
        handle.await.unwrap();

        let now = replay.virtual_time().unwrap();
        assert!((27.5..=30.0).contains(&now), "virtual time {now}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_stops_on_cancel() {
        let replay = running_replay(1.0);
        let cancellation = CancellationToken::new();
        let handle = spawn_replay_driver(replay.clone(), cancellation.clone(), DEFAULT_TICK_INTERVAL);

        cancellation.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("driver should stop")
            .unwrap();

        let frozen = replay.virtual_time();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(replay.virtual_time(), frozen);
    }
}
