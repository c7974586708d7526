//! Info command - print IGC header information.

use std::path::{Path, PathBuf};

use skyreplay::igc::{parse_igc_metadata, IgcFile, IgcMetadata};
use skyreplay::replay::SourceError;

use crate::error::CliError;

/// Run the info command over every file, reporting failures at the end.
pub fn run(files: &[PathBuf], headers_only: bool) -> Result<(), CliError> {
    let mut failed = 0;

    for (i, path) in files.iter().enumerate() {
        if i > 0 {
            println!();
        }
        if let Err(e) = print_file(path, headers_only) {
            eprintln!("{}: {}", path.display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(CliError::UnreadableFiles {
            failed,
            total: files.len(),
        });
    }
    Ok(())
}

fn print_file(path: &Path, headers_only: bool) -> Result<(), SourceError> {
    if headers_only {
        let metadata = parse_igc_metadata(path)?;
        println!("{}", path.display());
        print_metadata(&metadata);
        return Ok(());
    }

    let file = IgcFile::read(path)?;
    println!("{}", path.display());
    print_metadata(&file.metadata);
    println!("  Fixes:        {}", file.fixes.len());
    if file.skipped_records > 0 {
        println!("  Skipped:      {}", file.skipped_records);
    }
    if let (Some(first), Some(last)) = (file.fixes.first(), file.fixes.last()) {
        let minutes = (last.time - first.time) / 60.0;
        println!("  Duration:     {:.0} min", minutes);
    }
    Ok(())
}

fn print_metadata(metadata: &IgcMetadata) {
    let field = |value: &Option<String>| value.as_deref().unwrap_or("-").to_string();

    println!(
        "  Date:         {}",
        metadata
            .date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("  Pilot:        {}", field(&metadata.pilot));
    println!("  Glider:       {}", field(&metadata.glider_type));
    println!("  Registration: {}", field(&metadata.registration));
    println!("  Competition:  {}", field(&metadata.competition_id));
    println!("  Class:        {}", field(&metadata.competition_class));
}
