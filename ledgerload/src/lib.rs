#![doc = include_str!("../README.md")]

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod generator;
pub mod partition;
pub mod reporter;
pub mod store;
pub mod summarize;

pub use client::{ConfirmationStatus, HttpLedgerClient, LedgerClient};
pub use dispatcher::{DispatchConfig, EndpointOutcome, FailedTransaction, TransactionDispatcher};
pub use error::LedgerError;
pub use partition::{LoadPartitioner, Partition};
pub use reporter::{RunReport, RunReporter};

pub mod prelude {
    pub use crate::dispatcher::{shutdown_channel, Shutdown, ShutdownHandle};
    pub use crate::reporter::{analyze_durations_file, analyze_records_file, RunReport, RunReporter};
    pub use crate::{HttpLedgerClient, LedgerClient, LedgerError};

    pub use ledgerload_core::{Endpoint, PartitionBand, RunConfig, Summary};
}
