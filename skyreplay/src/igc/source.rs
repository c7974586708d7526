//! [`FixSource`] implementation for IGC files.

use std::path::Path;

use super::parser::{parse_igc_header, IgcFile, IgcMetadata};
use crate::replay::{FixSource, Recording, SourceError};

/// Reads IGC flight logs for replay.
///
/// The recording is labelled with the glider registration, or the
/// competition id when no registration is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgcSource;

impl FixSource for IgcSource {
    fn open(&self, path: &Path) -> Result<Recording, SourceError> {
        let file = IgcFile::read(path)?;

        if file.skipped_records > 0 {
            tracing::warn!(
                path = %path.display(),
                skipped = file.skipped_records,
                kept = file.fixes.len(),
                "Skipped unreadable or invalid B records"
            );
        }

        Ok(Recording {
            label: file.metadata.label().map(str::to_string),
            fixes: file.fixes,
        })
    }
}

/// Read only the header records of the IGC file at `path`.
pub fn parse_igc_metadata(path: &Path) -> Result<IgcMetadata, SourceError> {
    let file = std::fs::File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_igc_header(std::io::BufReader::new(file), path)
}
