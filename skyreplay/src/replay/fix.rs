//! Recorded fixes, emitted samples and the source boundary.
//!
//! - [`Fix`] - one recorded sample as read from a track file
//! - [`Sample`] - one position emitted by a track for a given virtual time
//! - [`FixSource`] - the decoder that turns a file into an ordered fix list

use std::path::Path;

use super::error::SourceError;

/// Geographic location in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true if both coordinates are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }

    /// Initial great-circle bearing towards `other`, in degrees (0-360).
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        y.atan2(x).to_degrees().rem_euclid(360.0)
    }
}

/// One recorded position sample.
///
/// Timestamps are seconds on the source's own clock (seconds of day for
/// flight logs). All tracks replayed together must share that time base.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    /// Seconds, monotonic within one source.
    pub time: f64,
    pub location: GeoPoint,
    /// Altitude MSL in meters.
    pub altitude: f64,
    /// Ground track in degrees, if the recorder logged one.
    pub track: Option<f64>,
    /// Vertical speed in m/s, if the recorder logged one.
    pub climb_rate: Option<f64>,
}

impl Fix {
    pub fn new(time: f64, location: GeoPoint, altitude: f64) -> Self {
        Self {
            time,
            location,
            altitude,
            track: None,
            climb_rate: None,
        }
    }

    pub fn with_track(mut self, track: f64) -> Self {
        self.track = Some(track);
        self
    }

    pub fn with_climb_rate(mut self, climb_rate: f64) -> Self {
        self.climb_rate = Some(climb_rate);
        self
    }

    /// Returns true if the fix can take part in replay.
    pub fn is_usable(&self) -> bool {
        self.time.is_finite() && self.altitude.is_finite() && self.location.is_valid()
    }
}

/// Position emitted by a track for one virtual time.
///
/// `time` is always the virtual time the sample was produced for, not the
/// timestamp of the nearest recorded fix.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub location: GeoPoint,
    /// Altitude MSL in meters.
    pub altitude: f64,
    /// Ground track in degrees (0-360), recorded or derived.
    pub heading: Option<f64>,
    /// Vertical speed in m/s, recorded or derived.
    pub climb_rate: Option<f64>,
}

impl Sample {
    /// Sample that holds a recorded fix unchanged at `time`.
    pub fn hold(fix: &Fix, time: f64) -> Self {
        Self {
            time,
            location: fix.location,
            altitude: fix.altitude,
            heading: fix.track,
            climb_rate: fix.climb_rate,
        }
    }
}

/// Decoded contents of one track file.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    /// Label found in the file (registration, callsign, ...), if any.
    pub label: Option<String>,
    /// Fixes in file order. May contain duplicates or time reversals.
    pub fixes: Vec<Fix>,
}

/// Decoder for recorded track files.
///
/// Implementations read the whole file eagerly. This is the only blocking
/// I/O in the replay path.
pub trait FixSource: Send + Sync {
    /// Read the file at `path` into a [`Recording`].
    fn open(&self, path: &Path) -> Result<Recording, SourceError>;
}
