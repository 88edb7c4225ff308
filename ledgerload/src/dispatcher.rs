//! Concurrent submit/confirm workflow against a single endpoint.
//!
//! Each call to [`TransactionDispatcher::dispatch`] spins up a bounded pool of worker tasks fed
//! from a bounded job queue. Workers push every outcome into an append-only collector, and the
//! call returns only after every worker has finished, so callers can aggregate without racing
//! in-flight transactions.
mod hook;
mod shutdown;
mod worker;

pub use shutdown::{shutdown_channel, Shutdown, ShutdownHandle};

use crate::client::LedgerClient;
use crate::error::TransactionError;
use async_channel::{bounded, unbounded};
use ledgerload_core::{
    Endpoint, RunConfig, TimingRecord, TransactionSpec, DEFAULT_POLL_INTERVAL, DEFAULT_WORKERS,
};
use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};
use worker::Worker;

#[derive(Clone, Debug, PartialEq)]
pub struct DispatchConfig {
    pub workers: NonZeroUsize,
    pub poll_interval: Duration,
    pub confirm_timeout: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirm_timeout: None,
        }
    }
}

impl From<&RunConfig> for DispatchConfig {
    fn from(config: &RunConfig) -> Self {
        Self {
            workers: config.workers,
            poll_interval: config.poll_interval,
            confirm_timeout: config.confirm_timeout,
        }
    }
}

/// A transaction that produced no timing record, and why.
#[derive(Debug)]
pub struct FailedTransaction {
    pub index: usize,
    pub endpoint: Endpoint,
    /// Identifier assigned by the endpoint, when submission got that far.
    pub transaction_id: Option<String>,
    /// Partial submit latency, kept for transactions that were accepted but never confirmed.
    pub submit_duration: Option<Duration>,
    pub error: TransactionError,
}

pub(crate) struct Job {
    pub index: usize,
    pub spec: TransactionSpec,
}

pub(crate) enum Outcome {
    Confirmed(TimingRecord),
    Failed(FailedTransaction),
}

impl Outcome {
    fn index(&self) -> usize {
        match self {
            Outcome::Confirmed(record) => record.index,
            Outcome::Failed(failure) => failure.index,
        }
    }
}

/// Everything one endpoint's dispatch produced: exactly one record or failure per transaction.
#[derive(Debug)]
pub struct EndpointOutcome {
    pub endpoint: Endpoint,
    pub records: Vec<TimingRecord>,
    pub failures: Vec<FailedTransaction>,
    pub elapsed: Duration,
}

impl EndpointOutcome {
    pub fn dispatched(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    pub fn failure_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.error.class()).or_insert(0) += 1;
        }
        counts
    }
}

pub struct TransactionDispatcher<C> {
    client: Arc<C>,
    config: DispatchConfig,
    shutdown: Shutdown,
}

impl<C> TransactionDispatcher<C>
where
    C: LedgerClient + Send + Sync + 'static,
{
    pub fn new(client: Arc<C>, config: DispatchConfig) -> Self {
        hook::describe();
        Self {
            client,
            config,
            shutdown: Shutdown::never(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Submit every spec to `endpoint` and wait for each to be confirmed, failed or cancelled.
    #[instrument(name = "dispatch", skip_all, fields(endpoint = %endpoint, count = specs.len()))]
    pub async fn dispatch(&self, endpoint: Endpoint, specs: Vec<TransactionSpec>) -> EndpointOutcome {
        let start = Instant::now();
        let count = specs.len();
        let workers = self.config.workers.get().min(count.max(1));
        info!("Dispatching {count} transactions with {workers} workers");

        let (job_tx, job_rx) = bounded(workers * 2);
        let (outcome_tx, outcome_rx) = unbounded();

        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    client: self.client.clone(),
                    endpoint: endpoint.clone(),
                    config: self.config.clone(),
                    shutdown: self.shutdown.clone(),
                };
                tokio::spawn(
                    worker
                        .run(job_rx.clone(), outcome_tx.clone())
                        .in_current_span(),
                )
            })
            .collect();
        drop(job_rx);
        drop(outcome_tx);

        for (index, spec) in specs.into_iter().enumerate() {
            if job_tx.send(Job { index, spec }).await.is_err() {
                error!("All workers for {endpoint} exited early; {} jobs not queued.", count - index);
                break;
            }
        }
        job_tx.close();

        // NOTE: Barrier. Nothing is aggregated until every worker has drained the queue.
        for handle in handles {
            if let Err(err) = handle.await {
                error!("Worker for {endpoint} failed: {err}");
            }
        }

        let mut records = Vec::with_capacity(count);
        let mut failures = vec![];
        let mut seen = HashSet::with_capacity(count);
        while let Ok(outcome) = outcome_rx.try_recv() {
            seen.insert(outcome.index());
            match outcome {
                Outcome::Confirmed(record) => records.push(record),
                Outcome::Failed(failure) => failures.push(failure),
            }
        }

        let lost: Vec<_> = (0..count).filter(|index| !seen.contains(index)).collect();
        if !lost.is_empty() {
            error!("{} transactions for {endpoint} were never reported.", lost.len());
        }
        failures.extend(lost.into_iter().map(|index| FailedTransaction {
            index,
            endpoint: endpoint.clone(),
            transaction_id: None,
            submit_duration: None,
            error: TransactionError::WorkerLost,
        }));

        let elapsed = start.elapsed();
        info!(
            "Dispatch complete: {} confirmed, {} failed in {}",
            records.len(),
            failures.len(),
            humantime::format_duration(elapsed)
        );

        EndpointOutcome {
            endpoint,
            records,
            failures,
            elapsed,
        }
    }
}
