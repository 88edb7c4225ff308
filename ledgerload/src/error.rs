use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use ledgerload_core::{ConfigError, ConfigLoadError};

/// Failure talking to a ledger endpoint.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unable to build endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Per-transaction failure. Collected alongside timing records, never propagated across workers.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("submission failed: {0}")]
    Submission(#[source] ClientError),

    #[error("not confirmed within {}", humantime::format_duration(*.0))]
    ConfirmationTimeout(Duration),

    #[error("cancelled before confirmation")]
    Cancelled,

    #[error("worker exited before reporting the transaction")]
    WorkerLost,
}

impl TransactionError {
    /// Stable class name used when counting failures.
    pub fn class(&self) -> &'static str {
        match self {
            TransactionError::Submission(_) => "submission",
            TransactionError::ConfirmationTimeout(_) => "confirmation-timeout",
            TransactionError::Cancelled => "cancelled",
            TransactionError::WorkerLost => "worker-lost",
        }
    }
}

/// A single malformed structured record. The record is skipped, the extraction continues.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing or non-string field {0}")]
    MissingField(&'static str),

    #[error("unparsable timestamp {0:?}")]
    BadTimestamp(String),
}

/// The input as a whole could not be loaded.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document has no top-level \"Transactions\" object")]
    MissingTransactions,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("payload store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed payload {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Fatal errors that stop a run.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    ConfigLoad(#[from] ConfigLoadError),

    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("payload store error: {0}")]
    Store(#[from] StoreError),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("dispatch task for an endpoint failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
