//! One replay target backed by one recorded source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::ReplayError;
use super::fix::{Fix, FixSource, Sample};
use super::interpolator::{interpolate, WINDOW_SIZE};
use super::trace::Trace;

/// A recorded track being replayed.
///
/// Owns the full fix sequence of its source, a cursor into it, the last
/// emitted sample and a bounded trace. The cursor only moves forward, and
/// emitted sample timestamps never decrease.
#[derive(Debug, Clone)]
pub struct Track {
    name: String,
    path: PathBuf,
    /// Strictly increasing in time, never empty.
    fixes: Vec<Fix>,
    /// Index of the next unread fix; `fixes.len()` once exhausted.
    cursor: usize,
    last: Option<Sample>,
    trace: Trace,
}

impl Track {
    /// Read a source and build a track from it.
    ///
    /// The track is named after the label found in the source, or after the
    /// file stem when the source carries none.
    pub fn open(
        source: &dyn FixSource,
        path: &Path,
        trace_capacity: usize,
    ) -> Result<Self, ReplayError> {
        let recording = source
            .open(path)
            .map_err(|source| ReplayError::SourceUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let name = recording
            .label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| label_from_path(path));

        Self::from_fixes(name, path, recording.fixes, trace_capacity)
    }

    /// Build a track from raw fixes.
    ///
    /// Duplicate timestamps, time reversals and fixes with invalid
    /// coordinates are skipped. Fails with [`ReplayError::EmptySource`] if
    /// nothing usable remains.
    pub fn from_fixes(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        raw: Vec<Fix>,
        trace_capacity: usize,
    ) -> Result<Self, ReplayError> {
        let name = name.into();
        let path = path.into();
        let total = raw.len();
        let fixes = sanitize(raw);

        if fixes.is_empty() {
            return Err(ReplayError::EmptySource { path });
        }

        let skipped = total - fixes.len();
        if skipped > 0 {
            tracing::warn!(
                track = %name,
                skipped,
                kept = fixes.len(),
                "Skipped duplicate, out-of-order or invalid fixes"
            );
        }

        tracing::debug!(
            track = %name,
            path = %path.display(),
            fixes = fixes.len(),
            first = fixes[0].time,
            last = fixes[fixes.len() - 1].time,
            "Track loaded"
        );

        Ok(Self {
            name,
            path,
            fixes,
            cursor: 0,
            last: None,
            trace: Trace::with_capacity(trace_capacity),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of usable fixes in the source.
    pub fn fix_count(&self) -> usize {
        self.fixes.len()
    }

    /// Timestamp of the first recorded fix.
    pub fn first_fix_time(&self) -> f64 {
        self.fixes[0].time
    }

    /// Timestamp of the next fix not yet passed by the replay.
    pub fn next_fix_time(&self) -> Option<f64> {
        self.fixes.get(self.cursor).map(|fix| fix.time)
    }

    /// The most recently emitted sample.
    pub fn last_sample(&self) -> Option<&Sample> {
        self.last.as_ref()
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// True once every recorded fix has been passed.
    ///
    /// An exhausted track keeps reporting its final position.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.fixes.len()
    }

    /// Produce the sample for virtual time `time`.
    ///
    /// Moves the cursor past every fix at or before `time`, interpolates the
    /// position, appends it to the trace and returns it. A `time` at or
    /// before the last emitted sample is a no-op returning that sample.
    pub fn advance_to(&mut self, time: f64) -> Sample {
        if let Some(last) = &self.last {
            if time <= last.time {
                return last.clone();
            }
        }

        let was_exhausted = self.is_exhausted();
        self.cursor += self.fixes[self.cursor..].partition_point(|fix| fix.time <= time);

        if !was_exhausted && self.is_exhausted() {
            tracing::debug!(track = %self.name, time, "Track reached end of recording");
        }

        let sample = self.sample_at(time);
        self.trace.push(sample.clone());
        self.last = Some(sample.clone());
        sample
    }

    /// Interpolate at `time` using the fixes around the cursor.
    fn sample_at(&self, time: f64) -> Sample {
        let half = WINDOW_SIZE / 2;
        let start = self.cursor.saturating_sub(half);
        let end = (self.cursor + half).min(self.fixes.len());

        interpolate(&self.fixes[start..end], time)
            .unwrap_or_else(|| Sample::hold(&self.fixes[0], time))
    }
}

/// Keep usable fixes with strictly increasing timestamps.
fn sanitize(raw: Vec<Fix>) -> Vec<Fix> {
    let mut fixes: Vec<Fix> = Vec::with_capacity(raw.len());
    for fix in raw {
        if !fix.is_usable() {
            continue;
        }
        if let Some(previous) = fixes.last() {
            if fix.time <= previous.time {
                continue;
            }
        }
        fixes.push(fix);
    }
    fixes
}

fn label_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| path.display().to_string())
}

/// Opens tracks without access to the engine.
///
/// Cheap to clone, so callers can move it onto a blocking thread and keep
/// file I/O out of the engine's critical section.
#[derive(Clone)]
pub struct TrackOpener {
    source: Arc<dyn FixSource>,
    trace_capacity: usize,
}

impl TrackOpener {
    pub fn new(source: Arc<dyn FixSource>, trace_capacity: usize) -> Self {
        Self {
            source,
            trace_capacity,
        }
    }

    pub fn open(&self, path: &Path) -> Result<Track, ReplayError> {
        Track::open(self.source.as_ref(), path, self.trace_capacity)
    }
}

impl std::fmt::Debug for TrackOpener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackOpener")
            .field("trace_capacity", &self.trace_capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::error::SourceError;
    use crate::replay::fix::{GeoPoint, Recording};

    /// One fix per second heading north, `count` fixes starting at `start`.
    fn fixes(start: f64, count: usize) -> Vec<Fix> {
        (0..count)
            .map(|i| {
                Fix::new(
                    start + i as f64,
                    GeoPoint::new(45.0 + i as f64 * 0.001, 7.0),
                    1000.0 + i as f64,
                )
            })
            .collect()
    }

    fn track(count: usize) -> Track {
        Track::from_fixes("A", "a.igc", fixes(0.0, count), 16).unwrap()
    }

    struct FixedSource(Option<Recording>);

    impl FixSource for FixedSource {
        fn open(&self, path: &Path) -> Result<Recording, SourceError> {
            self.0.clone().ok_or_else(|| SourceError::Malformed {
                path: path.to_path_buf(),
                reason: "unreadable".to_string(),
            })
        }
    }

    #[test]
    fn test_empty_source_rejected() {
        let result = Track::from_fixes("A", "a.igc", Vec::new(), 16);
        assert!(matches!(result, Err(ReplayError::EmptySource { .. })));
    }

    #[test]
    fn test_only_invalid_fixes_is_empty() {
        let raw = vec![Fix::new(1.0, GeoPoint::new(95.0, 7.0), 1000.0)];
        let result = Track::from_fixes("A", "a.igc", raw, 16);
        assert!(matches!(result, Err(ReplayError::EmptySource { .. })));
    }

    #[test]
    fn test_duplicates_and_reversals_skipped() {
        let mut raw = fixes(0.0, 5);
        raw.insert(2, raw[1].clone());
        raw.push(Fix::new(2.0, GeoPoint::new(45.0, 7.0), 1000.0));
        raw.push(Fix::new(10.0, GeoPoint::new(45.0, 7.0), 1000.0));

        let track = Track::from_fixes("A", "a.igc", raw, 16).unwrap();
        assert_eq!(track.fix_count(), 6);
        assert_eq!(track.fixes.last().map(|fix| fix.time), Some(10.0));
    }

    #[test]
    fn test_open_uses_label_then_file_stem() {
        let labelled = FixedSource(Some(Recording {
            label: Some("  D-KABC ".to_string()),
            fixes: fixes(0.0, 3),
        }));
        let track = Track::open(&labelled, Path::new("/logs/flight.igc"), 16).unwrap();
        assert_eq!(track.name(), "D-KABC");

        let unlabelled = FixedSource(Some(Recording {
            label: None,
            fixes: fixes(0.0, 3),
        }));
        let track = Track::open(&unlabelled, Path::new("/logs/flight.igc"), 16).unwrap();
        assert_eq!(track.name(), "flight");
        assert_eq!(track.path(), Path::new("/logs/flight.igc"));
    }

    #[test]
    fn test_open_unreadable_source() {
        let source = FixedSource(None);
        let result = Track::open(&source, Path::new("missing.igc"), 16);
        assert!(matches!(
            result,
            Err(ReplayError::SourceUnreadable { .. })
        ));
    }

    #[test]
    fn test_advance_to_exact_fix() {
        let mut track = track(20);
        let sample = track.advance_to(10.0);

        assert_eq!(sample.time, 10.0);
        assert!((sample.location.latitude - 45.010).abs() < 1e-9);
        assert!((sample.altitude - 1010.0).abs() < 1e-9);
        assert_eq!(track.next_fix_time(), Some(11.0));
    }

    #[test]
    fn test_advance_to_is_idempotent() {
        let mut track = track(20);
        let first = track.advance_to(5.5);
        let trace_len = track.trace().len();

        let again = track.advance_to(5.5);
        let earlier = track.advance_to(3.0);

        assert_eq!(first, again);
        assert_eq!(first, earlier);
        assert_eq!(track.trace().len(), trace_len);
        assert_eq!(track.next_fix_time(), Some(6.0));
    }

    #[test]
    fn test_sample_time_is_virtual_time() {
        let mut track = Track::from_fixes("B", "b.igc", fixes(100.0, 10), 16).unwrap();

        // Before the first fix the first position is held.
        let early = track.advance_to(50.0);
        assert_eq!(early.time, 50.0);
        assert_eq!(early.location, GeoPoint::new(45.0, 7.0));
        assert_eq!(track.next_fix_time(), Some(100.0));

        let mid = track.advance_to(104.0);
        assert_eq!(mid.time, 104.0);
    }

    #[test]
    fn test_exhausted_track_holds_final_fix() {
        let mut track = track(5);
        assert!(!track.is_exhausted());

        let sample = track.advance_to(4.0);
        assert!(track.is_exhausted());
        assert_eq!(track.next_fix_time(), None);
        assert!((sample.location.latitude - 45.004).abs() < 1e-9);

        let later = track.advance_to(60.0);
        assert_eq!(later.time, 60.0);
        assert_eq!(later.location, sample.location);
        assert!(track.is_exhausted());
    }

    #[test]
    fn test_trace_is_bounded_and_ordered() {
        let mut track = Track::from_fixes("A", "a.igc", fixes(0.0, 100), 8).unwrap();
        for step in 0..50 {
            track.advance_to(step as f64 * 0.5);
        }

        assert_eq!(track.trace().len(), 8);
        let times: Vec<f64> = track.trace().iter().map(|s| s.time).collect();
        assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(track.trace().latest(), track.last_sample());
    }

    #[test]
    fn test_opener_uses_trace_capacity() {
        let source = Arc::new(FixedSource(Some(Recording {
            label: Some("C".to_string()),
            fixes: fixes(0.0, 3),
        })));
        let opener = TrackOpener::new(source, 2);
        let track = opener.open(Path::new("c.igc")).unwrap();
        assert_eq!(track.trace().capacity(), 2);
    }
}
