//! Seam between the harness and the service under test.
mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::HttpLedgerClient;

use crate::error::ClientError;
use ledgerload_core::{Endpoint, TransactionSpec};
use serde::{Deserialize, Serialize};

/// Confirmation state of a submitted transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationStatus {
    pub solid: bool,
}

/// Submission and confirmation-status calls against a ledger endpoint.
///
/// Implement [`LedgerClient`] (the `Send` variant) to plug a client into the dispatcher.
#[trait_variant::make(LedgerClient: Send)]
pub trait LocalLedgerClient {
    /// Submit a transaction, returning the identifier the endpoint assigned to it.
    async fn submit(&self, endpoint: &Endpoint, spec: &TransactionSpec)
        -> Result<String, ClientError>;

    async fn status(&self, endpoint: &Endpoint, id: &str)
        -> Result<ConfirmationStatus, ClientError>;
}
