//! Error types for the replay module.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by a [`FixSource`](super::FixSource) implementation.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The file was read but is not a track file this source understands.
    #[error("{} is not a recognised track file: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// Errors returned by replay control operations.
///
/// Every variant leaves the engine exactly as it was before the call.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The source file is missing, unreadable or corrupt.
    #[error("Cannot open track source {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: SourceError,
    },

    /// The source was decoded but yielded no usable fixes.
    #[error("Track source {} contains no usable fixes", .path.display())]
    EmptySource { path: PathBuf },

    /// A track with this name is already loaded.
    #[error("A track named '{0}' is already loaded")]
    DuplicateName(String),

    /// No track with this name is loaded.
    #[error("No track named '{0}'")]
    UnknownTrack(String),

    /// Negative or non-finite playback rate.
    #[error("Invalid time scale {0}: must be a finite value >= 0")]
    InvalidScale(f64),
}

impl ReplayError {
    /// Returns true if the error came from opening a source.
    ///
    /// `start` and `add_track` fail with one of these when the file cannot
    /// be used; the caller may offer another file.
    pub fn is_open_failure(&self) -> bool {
        matches!(
            self,
            ReplayError::SourceUnreadable { .. } | ReplayError::EmptySource { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failure_classification() {
        let unreadable = ReplayError::SourceUnreadable {
            path: PathBuf::from("a.igc"),
            source: SourceError::Io {
                path: PathBuf::from("a.igc"),
                source: io::Error::new(io::ErrorKind::NotFound, "missing"),
            },
        };
        assert!(unreadable.is_open_failure());
        assert!(ReplayError::EmptySource {
            path: PathBuf::from("b.igc")
        }
        .is_open_failure());

        assert!(!ReplayError::DuplicateName("A".to_string()).is_open_failure());
        assert!(!ReplayError::InvalidScale(-1.0).is_open_failure());
    }

    #[test]
    fn test_error_messages_include_path() {
        let err = ReplayError::EmptySource {
            path: PathBuf::from("/tmp/flight.igc"),
        };
        assert_eq!(
            err.to_string(),
            "Track source /tmp/flight.igc contains no usable fixes"
        );

        let err = ReplayError::DuplicateName("D-1234".to_string());
        assert_eq!(err.to_string(), "A track named 'D-1234' is already loaded");
    }
}
