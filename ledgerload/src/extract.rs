//! Latency samples recovered from text reports and structured transaction records.
mod records;
mod text;
mod timestamp;

pub use records::{extract_record_samples, extract_record_samples_from_file, RecordSamples};
pub use text::{extract_durations, extract_durations_from_file};
pub use timestamp::parse_timestamp;

use crate::error::ExtractError;
use std::path::Path;

fn read_input(path: &Path) -> Result<String, ExtractError> {
    std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })
}
