//! Thread-safe handle to a replay engine.
//!
//! [`SharedReplay`] serialises every operation through one lock, so a
//! `remove_track` racing a `tick` or a `snapshot` is always observed either
//! completely before or completely after. After each mutation the handle
//! publishes a fresh [`ReplaySnapshot`] on a watch channel for renderers
//! that prefer push over polling.
//!
//! Readers never take the engine lock; they are served from the latest
//! published snapshot.
//!
//! Opening a source is the only blocking step. `start` and `add_track` run
//! it on the blocking pool without holding the lock, so a slow disk never
//! stalls the tick driver.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::engine::ReplayEngine;
use super::error::{ReplayError, SourceError};
use super::fix::{FixSource, Sample};
use super::snapshot::{ReplaySnapshot, ReplayState, TrafficSample};
use super::track::{Track, TrackOpener};
use crate::config::ReplayConfig;

/// Cloneable, thread-safe handle to a [`ReplayEngine`].
#[derive(Clone)]
pub struct SharedReplay {
    engine: Arc<Mutex<ReplayEngine>>,
    snapshots: Arc<watch::Sender<Arc<ReplaySnapshot>>>,
    opener: TrackOpener,
}

impl SharedReplay {
    /// Wrap an engine.
    pub fn new(engine: ReplayEngine) -> Self {
        let opener = engine.opener();
        let (snapshots, _) = watch::channel(Arc::new(engine.snapshot()));
        Self {
            engine: Arc::new(Mutex::new(engine)),
            snapshots: Arc::new(snapshots),
            opener,
        }
    }

    /// Create a handle around a fresh engine.
    pub fn with_config(source: Arc<dyn FixSource>, config: ReplayConfig) -> Self {
        Self::new(ReplayEngine::with_config(source, config))
    }

    /// Open `path` as the reference track and start playback.
    pub async fn start(&self, path: impl AsRef<Path>) -> Result<String, ReplayError> {
        let track = self.open_blocking(path.as_ref()).await?;
        self.with_engine(|engine| engine.start_with(track))
    }

    /// Open `path` and add it as an additional track.
    pub async fn add_track(&self, path: impl AsRef<Path>) -> Result<String, ReplayError> {
        let track = self.open_blocking(path.as_ref()).await?;
        self.with_engine(|engine| engine.insert_track(track))
    }

    pub fn remove_track(&self, name: &str) -> Result<(), ReplayError> {
        self.with_engine(|engine| engine.remove_track(name))
    }

    pub fn set_time_scale(&self, scale: f64) -> Result<(), ReplayError> {
        self.with_engine(|engine| engine.set_time_scale(scale))
    }

    pub fn fast_forward(&self, delta: f64) -> bool {
        self.with_engine(|engine| engine.fast_forward(delta))
    }

    pub fn tick(&self, elapsed: Duration) {
        self.with_engine(|engine| engine.tick(elapsed));
    }

    pub fn stop(&self) {
        self.with_engine(ReplayEngine::stop);
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<ReplaySnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Receive a new snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ReplaySnapshot>> {
        self.snapshots.subscribe()
    }

    pub fn state(&self) -> ReplayState {
        self.snapshots.borrow().state
    }

    pub fn virtual_time(&self) -> Option<f64> {
        self.snapshots.borrow().virtual_time
    }

    pub fn track_count(&self) -> usize {
        self.snapshots.borrow().track_count()
    }

    pub fn sample(&self, index: usize) -> Option<TrafficSample> {
        self.snapshots.borrow().sample(index)
    }

    pub fn trace(&self, index: usize) -> Option<Vec<Sample>> {
        self.snapshots.borrow().trace(index).map(<[Sample]>::to_vec)
    }

    pub fn all_exhausted(&self) -> bool {
        self.snapshots.borrow().all_exhausted()
    }

    /// Run `f` under the lock and publish the resulting state.
    fn with_engine<T>(&self, f: impl FnOnce(&mut ReplayEngine) -> T) -> T {
        let mut engine = self.engine.lock();
        let result = f(&mut *engine);
        self.snapshots.send_replace(Arc::new(engine.snapshot()));
        result
    }

    async fn open_blocking(&self, path: &Path) -> Result<Track, ReplayError> {
        let opener = self.opener.clone();
        let owned: PathBuf = path.to_path_buf();

        match tokio::task::spawn_blocking(move || opener.open(&owned)).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(ReplayError::SourceUnreadable {
                path: path.to_path_buf(),
                source: SourceError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::Interrupted, err.to_string()),
                },
            }),
        }
    }
}

impl std::fmt::Debug for SharedReplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedReplay")
            .field("snapshot", &**self.snapshots.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::fix::{Fix, GeoPoint, Recording};

    /// Every path yields a 1 Hz straight-line recording named after the
    /// file stem; paths containing "broken" fail to open.
    struct LineSource;

    impl FixSource for LineSource {
        fn open(&self, path: &Path) -> Result<Recording, SourceError> {
            if path.to_string_lossy().contains("broken") {
                return Err(SourceError::Malformed {
                    path: path.to_path_buf(),
                    reason: "no B records".to_string(),
                });
            }
            let fixes = (0..=600)
                .map(|t| {
                    Fix::new(
                        t as f64,
                        GeoPoint::new(46.0, 8.0 + t as f64 * 0.0001),
                        1500.0,
                    )
                })
                .collect();
            Ok(Recording { label: None, fixes })
        }
    }

    fn shared() -> SharedReplay {
        SharedReplay::with_config(Arc::new(LineSource), ReplayConfig::default())
    }

    #[tokio::test]
    async fn test_start_and_add_through_handle() {
        let replay = shared();

        assert_eq!(replay.start("lead.igc").await.unwrap(), "lead");
        assert_eq!(replay.add_track("wing.igc").await.unwrap(), "wing");

        assert_eq!(replay.state(), ReplayState::Active);
        assert_eq!(replay.track_count(), 2);
        assert_eq!(replay.sample(1).unwrap().label, "wing");
    }

    #[tokio::test]
    async fn test_open_failure_keeps_state() {
        let replay = shared();
        replay.start("lead.igc").await.unwrap();

        let err = replay.add_track("broken.igc").await.unwrap_err();

        assert!(err.is_open_failure());
        assert_eq!(replay.track_count(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_published_after_mutation() {
        let replay = shared();
        let mut rx = replay.subscribe();
        assert_eq!(rx.borrow().state, ReplayState::Idle);

        replay.start("lead.igc").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, ReplayState::Active);

        replay.tick(Duration::from_secs(3));
        assert_eq!(replay.snapshot().virtual_time, Some(3.0));
        assert_eq!(rx.borrow_and_update().virtual_time, Some(3.0));
    }

    #[tokio::test]
    async fn test_clones_share_engine() {
        let replay = shared();
        let other = replay.clone();

        replay.start("lead.igc").await.unwrap();
        other.set_time_scale(4.0).unwrap();
        replay.tick(Duration::from_secs(1));

        assert_eq!(other.virtual_time(), Some(4.0));
        assert_eq!(other.snapshot().time_scale, 4.0);
    }

    #[tokio::test]
    async fn test_concurrent_remove_and_tick() {
        let replay = shared();
        replay.start("a.igc").await.unwrap();
        for name in ["b.igc", "c.igc", "d.igc"] {
            replay.add_track(name).await.unwrap();
        }

        let ticker = {
            let replay = replay.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    replay.tick(Duration::from_millis(100));
                    tokio::task::yield_now().await;
                }
            })
        };
        for name in ["a", "c", "b"] {
            replay.remove_track(name).unwrap();
            tokio::task::yield_now().await;
        }
        ticker.await.unwrap();

        let snapshot = replay.snapshot();
        assert_eq!(snapshot.track_count(), 1);
        assert_eq!(snapshot.reference.as_deref(), Some("d"));
        assert_eq!(snapshot.state, ReplayState::Active);
    }

    #[tokio::test]
    async fn test_stop_through_handle() {
        let replay = shared();
        replay.start("lead.igc").await.unwrap();

        replay.stop();

        assert_eq!(replay.state(), ReplayState::Idle);
        assert_eq!(replay.snapshot().track_count(), 0);
        assert!(!replay.all_exhausted());
    }
}
