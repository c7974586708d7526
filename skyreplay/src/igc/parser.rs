//! IGC flight-log record parsing.
//!
//! Only the records needed for replay are decoded:
//!
//! | record | content |
//! |---|---|
//! | `A` | logger id, accepted and ignored |
//! | `H` | header fields: date, pilot, glider, registration, competition |
//! | `I` | B-record extensions, used for the `TRT` true track field |
//! | `B` | one fix: time, position, validity, pressure and GNSS altitude |
//!
//! Every other record type is skipped.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::replay::{Fix, GeoPoint, SourceError};

/// Minimum length of a B record without extensions.
const B_RECORD_LEN: usize = 35;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A clock drop larger than this between consecutive fixes is a midnight
/// wrap rather than a glitch.
const MIDNIGHT_WRAP_THRESHOLD: f64 = SECONDS_PER_DAY / 2.0;

/// Header information of an IGC file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgcMetadata {
    /// Flight date from `HFDTE`.
    pub date: Option<NaiveDate>,
    pub pilot: Option<String>,
    pub glider_type: Option<String>,
    /// Glider registration from `HFGID`.
    pub registration: Option<String>,
    /// Competition id from `HFCID`.
    pub competition_id: Option<String>,
    pub competition_class: Option<String>,
}

impl IgcMetadata {
    /// Display label for the flight: registration, else competition id.
    pub fn label(&self) -> Option<&str> {
        self.registration
            .as_deref()
            .or(self.competition_id.as_deref())
    }
}

/// A fully decoded IGC file.
#[derive(Debug, Clone, Default)]
pub struct IgcFile {
    pub metadata: IgcMetadata,
    /// Fixes in file order, times in seconds since UTC midnight of the
    /// flight date. Fixes after a midnight wrap continue past 86 400.
    pub fixes: Vec<Fix>,
    /// B records that could not be decoded or carried no GPS fix.
    pub skipped_records: usize,
}

impl IgcFile {
    /// Read and decode the IGC file at `path`.
    pub fn read(path: &Path) -> Result<Self, SourceError> {
        let file = std::fs::File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_igc(std::io::BufReader::new(file), path)
    }
}

/// Byte range of one B-record extension declared by an `I` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extension {
    start: usize,
    end: usize,
}

/// Extensions the decoder understands.
#[derive(Debug, Clone, Copy, Default)]
struct Extensions {
    true_track: Option<Extension>,
}

/// Decode an IGC stream.
///
/// `path` is only used in error values.
pub fn parse_igc<R: BufRead>(reader: R, path: &Path) -> Result<IgcFile, SourceError> {
    let mut parser = Parser::new(path, false);
    parser.run(reader)?;
    parser.finish()
}

/// Decode only the header of an IGC stream, stopping at the first B record.
pub fn parse_igc_header<R: BufRead>(reader: R, path: &Path) -> Result<IgcMetadata, SourceError> {
    let mut parser = Parser::new(path, true);
    parser.run(reader)?;
    parser.finish().map(|file| file.metadata)
}

struct Parser {
    path: PathBuf,
    headers_only: bool,
    recognised: bool,
    extensions: Extensions,
    /// Added to every B-record time after a midnight wrap.
    day_offset: f64,
    previous_time: Option<f64>,
    file: IgcFile,
}

impl Parser {
    fn new(path: &Path, headers_only: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            headers_only,
            recognised: false,
            extensions: Extensions::default(),
            day_offset: 0.0,
            previous_time: None,
            file: IgcFile::default(),
        }
    }

    fn run<R: BufRead>(&mut self, reader: R) -> Result<(), SourceError> {
        for line in reader.split(b'\n') {
            let line = line.map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);

            match line.as_bytes().first() {
                Some(b'A') if line.len() >= 4 => self.recognised = true,
                Some(b'H') => self.header_record(line),
                Some(b'I') => self.extension_record(line),
                Some(b'B') => {
                    if self.headers_only {
                        self.recognised = true;
                        break;
                    }
                    self.fix_record(line);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<IgcFile, SourceError> {
        if !self.recognised {
            return Err(SourceError::Malformed {
                path: self.path,
                reason: "no IGC records found".to_string(),
            });
        }
        Ok(self.file)
    }

    fn header_record(&mut self, line: &str) {
        let Some((source, code, value)) = split_header(line) else {
            return;
        };
        if !matches!(source, 'F' | 'O' | 'P') {
            return;
        }
        self.recognised = true;

        let metadata = &mut self.file.metadata;
        match code {
            "DTE" => metadata.date = parse_date(value),
            "PLT" => metadata.pilot = header_value(value),
            "GTY" => metadata.glider_type = header_value(value),
            "GID" => metadata.registration = header_value(value),
            "CID" => metadata.competition_id = header_value(value),
            "CCL" => metadata.competition_class = header_value(value),
            _ => {}
        }
    }

    fn extension_record(&mut self, line: &str) {
        if let Some(extensions) = parse_extensions(line) {
            self.recognised = true;
            self.extensions = extensions;
        }
    }

    fn fix_record(&mut self, line: &str) {
        let Some(mut fix) = parse_fix(line, &self.extensions) else {
            self.file.skipped_records += 1;
            return;
        };
        self.recognised = true;

        if let Some(previous) = self.previous_time {
            if fix.time + self.day_offset < previous - MIDNIGHT_WRAP_THRESHOLD {
                self.day_offset += SECONDS_PER_DAY;
            }
        }
        fix.time += self.day_offset;
        self.previous_time = Some(fix.time);
        self.file.fixes.push(fix);
    }
}

/// Split `H<source><code><long name>:<value>` into its parts.
fn split_header(line: &str) -> Option<(char, &str, &str)> {
    let source = line.chars().nth(1)?;
    let code = line.get(2..5)?;
    let rest = line.get(5..)?;
    let value = match rest.split_once(':') {
        Some((_, value)) => value,
        None => rest,
    };
    Some((source, code, value))
}

fn header_value(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("NOT SET") {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse `DDMMYY`, optionally followed by `,NN` (flight number).
fn parse_date(value: &str) -> Option<NaiveDate> {
    let digits = value.trim().get(0..6)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: u32 = digits[0..2].parse().ok()?;
    let month: u32 = digits[2..4].parse().ok()?;
    let year: i32 = digits[4..6].parse().ok()?;
    let year = if year < 80 { 2000 + year } else { 1900 + year };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse `I<NN>` followed by `NN` groups of `<start:2><end:2><code:3>`.
fn parse_extensions(line: &str) -> Option<Extensions> {
    let count: usize = line.get(1..3)?.parse().ok()?;
    let mut extensions = Extensions::default();

    for i in 0..count {
        let offset = 3 + i * 7;
        let group = line.get(offset..offset + 7)?;
        let start: usize = group.get(0..2)?.parse().ok()?;
        let end: usize = group.get(2..4)?.parse().ok()?;
        // Columns are 1-based and inclusive.
        if start == 0 || end < start {
            return None;
        }
        if &group[4..7] == "TRT" {
            extensions.true_track = Some(Extension {
                start: start - 1,
                end,
            });
        }
    }

    Some(extensions)
}

/// Parse a B record. Returns `None` for malformed records and for records
/// without a valid GPS fix.
fn parse_fix(line: &str, extensions: &Extensions) -> Option<Fix> {
    if line.len() < B_RECORD_LEN || !line.is_ascii() {
        return None;
    }

    let time = parse_time(&line[1..7])?;
    let location = parse_location(&line[7..24])?;
    if &line[24..25] != "A" {
        return None;
    }

    let pressure_altitude = parse_altitude(&line[25..30]);
    let gnss_altitude = parse_altitude(&line[30..35]);
    let altitude = match (gnss_altitude, pressure_altitude) {
        (Some(gnss), _) if gnss != 0 => gnss,
        (_, Some(pressure)) => pressure,
        (Some(gnss), None) => gnss,
        (None, None) => return None,
    };

    let mut fix = Fix::new(time, location, altitude as f64);
    if let Some(ext) = extensions.true_track {
        let track = line
            .get(ext.start..ext.end)
            .and_then(|value| value.trim().parse::<f64>().ok());
        if let Some(track) = track {
            fix = fix.with_track(track.rem_euclid(360.0));
        }
    }
    Some(fix)
}

/// Parse `HHMMSS` into seconds of day.
fn parse_time(value: &str) -> Option<f64> {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u32 = value[0..2].parse().ok()?;
    let minutes: u32 = value[2..4].parse().ok()?;
    let seconds: u32 = value[4..6].parse().ok()?;
    if hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }
    Some((hours * 3600 + minutes * 60 + seconds) as f64)
}

/// Parse `DDMMmmm[NS]DDDMMmmm[EW]`.
fn parse_location(value: &str) -> Option<GeoPoint> {
    let latitude = parse_angle(&value[0..2], &value[2..7], &value[7..8], 'N', 'S')?;
    let longitude = parse_angle(&value[8..11], &value[11..16], &value[16..17], 'E', 'W')?;
    let point = GeoPoint::new(latitude, longitude);
    point.is_valid().then_some(point)
}

/// Degrees plus `MMmmm` thousandths of minutes, signed by hemisphere.
fn parse_angle(
    degrees: &str,
    minutes: &str,
    hemisphere: &str,
    positive: char,
    negative: char,
) -> Option<f64> {
    if !degrees.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let degrees: f64 = degrees.parse().ok()?;
    let minutes: f64 = minutes.parse::<f64>().ok()? / 1000.0;
    if minutes >= 60.0 {
        return None;
    }
    let value = degrees + minutes / 60.0;

    match hemisphere.chars().next()? {
        c if c == positive => Some(value),
        c if c == negative => Some(-value),
        _ => None,
    }
}

/// Parse a signed five-character altitude in meters.
fn parse_altitude(value: &str) -> Option<i32> {
    value.trim().parse().ok()
}
