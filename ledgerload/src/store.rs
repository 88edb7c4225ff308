//! Generated payloads persisted as one JSON file per transaction.
use crate::error::StoreError;
use ledgerload_core::TransactionSpec;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub fn payload_path(dir: &Path, label: &str, index: usize) -> PathBuf {
    dir.join(format!("transaction_{label}_{index}.json"))
}

/// Write `transaction_{label}_{i}.json` for every spec, creating `dir` when needed.
pub fn write_payloads(
    dir: &Path,
    label: &str,
    specs: &[TransactionSpec],
) -> Result<usize, StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for (index, spec) in specs.iter().enumerate() {
        let path = payload_path(dir, label, index);
        let bytes = serde_json::to_vec(spec).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, bytes).map_err(|source| StoreError::Io { path, source })?;
        debug!("Saved item {index}");
    }

    info!("Saved {} payloads for {label} in {}", specs.len(), dir.display());
    Ok(specs.len())
}

/// Read consecutive payloads for `label`, starting at index 0 and stopping at the first gap.
pub fn read_payloads(dir: &Path, label: &str) -> Result<Vec<TransactionSpec>, StoreError> {
    let mut specs = vec![];
    loop {
        let path = payload_path(dir, label, specs.len());
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => break,
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let spec = serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        specs.push(spec);
    }
    debug!("Loaded {} payloads for {label}", specs.len());
    Ok(specs)
}
