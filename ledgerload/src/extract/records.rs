use super::{parse_timestamp, read_input};
use crate::error::{ExtractError, RecordError};
use ledgerload_core::OUTLIER_CEILING_MS;
use serde_json::{Map, Value};
use std::path::Path;
use time::OffsetDateTime;
#[allow(unused)]
use tracing::{debug, trace, warn};

/// Paired samples derived from per-transaction timestamps, in milliseconds.
///
/// `added_minus_created[i]` and `confirmed_minus_added[i]` always come from the same transaction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordSamples {
    pub added_minus_created: Vec<f64>,
    pub confirmed_minus_added: Vec<f64>,
    /// Malformed records that were skipped.
    pub skipped: usize,
    /// Records dropped by the outlier filter.
    pub outliers: usize,
}

impl RecordSamples {
    pub fn len(&self) -> usize {
        self.confirmed_minus_added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed_minus_added.is_empty()
    }
}

/// Derive samples from a document of the form `{"Transactions": {id: {TimestampCreated, ...}}}`.
///
/// Samples follow the order of the document. Malformed records are skipped. A transaction whose confirmation latency is negative or above
/// [`OUTLIER_CEILING_MS`] contributes to neither sequence.
pub fn extract_record_samples(document: &str) -> Result<RecordSamples, ExtractError> {
    let root: Value = serde_json::from_str(document)?;
    let transactions = root
        .get("Transactions")
        .and_then(Value::as_object)
        .ok_or(ExtractError::MissingTransactions)?;

    let mut samples = RecordSamples::default();
    for (id, record) in transactions {
        let (added, confirmed) = match derive_pair(record) {
            Ok(pair) => pair,
            Err(err) => {
                warn!("Skipping transaction {id}: {err}");
                samples.skipped += 1;
                continue;
            }
        };

        if !(0. ..=OUTLIER_CEILING_MS).contains(&confirmed) {
            trace!("Dropping outlier {id}: confirmed - added = {confirmed}ms");
            samples.outliers += 1;
            continue;
        }

        samples.added_minus_created.push(added);
        samples.confirmed_minus_added.push(confirmed);
    }

    debug!(
        "Extracted {} record pairs ({} skipped, {} outliers)",
        samples.len(),
        samples.skipped,
        samples.outliers
    );
    Ok(samples)
}

pub fn extract_record_samples_from_file(
    path: impl AsRef<Path>,
) -> Result<RecordSamples, ExtractError> {
    extract_record_samples(&read_input(path.as_ref())?)
}

fn derive_pair(record: &Value) -> Result<(f64, f64), RecordError> {
    let fields = record.as_object().ok_or(RecordError::NotAnObject)?;
    let created = timestamp(fields, "TimestampCreated")?;
    let added = timestamp(fields, "TimestampAdded")?;
    let confirmed = timestamp(fields, "TimestampConfirmed")?;
    Ok((millis_between(created, added), millis_between(added, confirmed)))
}

fn timestamp(fields: &Map<String, Value>, name: &'static str) -> Result<OffsetDateTime, RecordError> {
    let raw = fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or(RecordError::MissingField(name))?;
    parse_timestamp(raw)
}

fn millis_between(from: OffsetDateTime, to: OffsetDateTime) -> f64 {
    (to - from).as_seconds_f64() * 1e3
}
