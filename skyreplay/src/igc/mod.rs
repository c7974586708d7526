//! IGC flight-log support.
//!
//! IGC is the FAI format written by gliding and paragliding flight
//! recorders. Each file holds one flight: header records describing pilot
//! and aircraft, and B records with one GPS fix each, usually every one to
//! four seconds.

mod parser;
mod source;

pub use parser::{parse_igc, parse_igc_header, IgcFile, IgcMetadata};
pub use source::{parse_igc_metadata, IgcSource};
