//! End-to-end runs and the human-readable reports they produce.
use crate::client::LedgerClient;
use crate::dispatcher::{DispatchConfig, EndpointOutcome, Shutdown, TransactionDispatcher};
use crate::error::{ExtractError, LedgerError};
use crate::extract::{self, RecordSamples};
use crate::generator::TransactionGenerator;
use crate::partition::{LoadPartitioner, Partition};
use crate::store;
use crate::summarize::{mean, summarize};
use futures_util::future::join_all;
use ledgerload_core::{
    Endpoint, LatencyKind, RunConfig, Summary, TimingRecord, TransactionSpec,
};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, instrument, Instrument};

/// Drives partition, generation, dispatch and aggregation for one run.
pub struct RunReporter<C> {
    config: RunConfig,
    client: Arc<C>,
    shutdown: Shutdown,
}

impl<C> RunReporter<C>
where
    C: LedgerClient + Send + Sync + 'static,
{
    pub fn new(config: RunConfig, client: Arc<C>) -> Self {
        Self {
            config,
            client,
            shutdown: Shutdown::never(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Partition the configured total, generate payloads and dispatch them to every endpoint.
    ///
    /// Configuration errors abort before anything is submitted.
    #[instrument(name = "run", skip_all, fields(total = self.config.total))]
    pub async fn run(&self) -> Result<RunReport, LedgerError> {
        self.config.validate()?;
        let partition = LoadPartitioner::from_config(&self.config)?
            .partition(self.config.total, &self.config.endpoints)?;
        info!("Partition: {partition}");

        let batches = TransactionGenerator::from_config(&self.config).for_partition(&partition);

        self.dispatch_all(partition, batches).await
    }

    /// Dispatch payloads previously persisted with [`store::write_payloads`], labelled per endpoint.
    #[instrument(name = "run", skip_all, fields(payloads = %dir.display()))]
    pub async fn run_stored(&self, dir: &Path) -> Result<RunReport, LedgerError> {
        let mut batches = Vec::with_capacity(self.config.endpoints.len());
        for endpoint in &self.config.endpoints {
            let specs = store::read_payloads(dir, &endpoint.label())?;
            batches.push((endpoint.clone(), specs));
        }

        let partition = Partition::from_counts(
            batches
                .iter()
                .map(|(endpoint, specs)| (endpoint.clone(), specs.len() as u64))
                .collect(),
        );
        info!("Stored partition: {partition}");

        self.dispatch_all(partition, batches).await
    }

    async fn dispatch_all(
        &self,
        partition: Partition,
        batches: Vec<(Endpoint, Vec<TransactionSpec>)>,
    ) -> Result<RunReport, LedgerError> {
        let dispatcher = Arc::new(
            TransactionDispatcher::new(self.client.clone(), DispatchConfig::from(&self.config))
                .with_shutdown(self.shutdown.clone()),
        );

        let start = Instant::now();
        let tasks: Vec<_> = batches
            .into_iter()
            .map(|(endpoint, specs)| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(
                    async move { dispatcher.dispatch(endpoint, specs).await }.in_current_span(),
                )
            })
            .collect();

        let mut outcomes = Vec::with_capacity(tasks.len());
        for res in join_all(tasks).await {
            outcomes.push(res?);
        }
        let elapsed = start.elapsed();

        let report = RunReport::new(partition, outcomes, elapsed, self.config.show_raw);
        info!(
            "Run complete: {} confirmed, {} failed in {}",
            report.confirmed(),
            report.failed(),
            humantime::format_duration(elapsed)
        );
        Ok(report)
    }
}

/// Samples of one kind together with their summary.
#[derive(Clone, Debug)]
pub struct LatencySet {
    pub kind: LatencyKind,
    pub samples: Vec<f64>,
    pub summary: Summary,
}

impl LatencySet {
    fn collect<'a>(kind: LatencyKind, records: impl Iterator<Item = &'a TimingRecord>) -> Self {
        let samples: Vec<f64> = records
            .flat_map(|record| record.samples())
            .filter(|sample| sample.kind == kind)
            .map(|sample| sample.millis)
            .collect();
        let summary = summarize(&samples);
        Self {
            kind,
            samples,
            summary,
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub partition: Partition,
    pub outcomes: Vec<EndpointOutcome>,
    pub elapsed: Duration,
    pub latencies: Vec<LatencySet>,
    show_raw: bool,
}

impl RunReport {
    pub fn new(
        partition: Partition,
        outcomes: Vec<EndpointOutcome>,
        elapsed: Duration,
        show_raw: bool,
    ) -> Self {
        let latencies = [LatencyKind::Submit, LatencyKind::Confirm, LatencyKind::Total]
            .into_iter()
            .map(|kind| LatencySet::collect(kind, outcomes.iter().flat_map(|o| &o.records)))
            .collect();

        Self {
            partition,
            outcomes,
            elapsed,
            latencies,
            show_raw,
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &TimingRecord> {
        self.outcomes.iter().flat_map(|outcome| &outcome.records)
    }

    pub fn latency(&self, kind: LatencyKind) -> Option<&LatencySet> {
        self.latencies.iter().find(|set| set.kind == kind)
    }

    pub fn confirmed(&self) -> usize {
        self.outcomes.iter().map(|outcome| outcome.records.len()).sum()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().map(|outcome| outcome.failures.len()).sum()
    }

    pub fn failure_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            for (class, count) in outcome.failure_counts() {
                *counts.entry(class).or_insert(0) += count;
            }
        }
        counts
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Partition: {}", self.partition)?;
        for outcome in &self.outcomes {
            write!(
                f,
                "{}: {} confirmed, {} failed",
                outcome.endpoint,
                outcome.records.len(),
                outcome.failures.len()
            )?;
            write_failure_counts(f, &outcome.failure_counts())?;
            writeln!(f)?;
        }

        let dispatched = self.confirmed() + self.failed();
        writeln!(
            f,
            "Total time for {dispatched} transactions: {:.2} seconds",
            self.elapsed.as_secs_f64()
        )?;

        let secs = |kind| {
            self.latency(kind)
                .and_then(|set| mean(&set.samples))
                .map(|ms| ms / 1e3)
        };
        if let Some(avg) = secs(LatencyKind::Submit) {
            writeln!(f, "Average transaction submit time: {avg:.2} seconds")?;
        }
        if let Some(avg) = secs(LatencyKind::Total) {
            writeln!(f, "Average transaction confirmation time: {avg:.2} seconds")?;
        }
        if self.failed() > 0 {
            write!(f, "Failures: {}", self.failed())?;
            write_failure_counts(f, &self.failure_counts())?;
            writeln!(f)?;
        }

        for set in &self.latencies {
            writeln!(f)?;
            writeln!(f, "Percentiles for {} latency:", set.kind)?;
            write_section(f, &set.samples, &set.summary, self.show_raw)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

fn write_failure_counts(
    f: &mut fmt::Formatter<'_>,
    counts: &BTreeMap<&'static str, usize>,
) -> fmt::Result {
    if counts.is_empty() {
        return Ok(());
    }
    let parts: Vec<String> = counts
        .iter()
        .map(|(class, count)| format!("{class}={count}"))
        .collect();
    write!(f, " ({})", parts.join(", "))
}

fn write_section(
    f: &mut fmt::Formatter<'_>,
    samples: &[f64],
    summary: &Summary,
    show_raw: bool,
) -> fmt::Result {
    match summary {
        Summary::NoData => write!(f, "{summary}"),
        Summary::Report(report) => {
            writeln!(f, "Count: {}", report.count)?;
            if show_raw {
                writeln!(f, "All Durations: {samples:?}")?;
            }
            write!(f, "{report}")
        }
    }
}

/// Percentiles of the durations scraped from a text report.
#[derive(Clone, Debug)]
pub struct DurationAnalysis {
    pub samples: Vec<f64>,
    pub summary: Summary,
    show_raw: bool,
}

pub fn analyze_durations(text: &str, show_raw: bool) -> DurationAnalysis {
    let samples = extract::extract_durations(text);
    let summary = summarize(&samples);
    DurationAnalysis {
        samples,
        summary,
        show_raw,
    }
}

pub fn analyze_durations_file(
    path: impl AsRef<Path>,
    show_raw: bool,
) -> Result<DurationAnalysis, ExtractError> {
    let samples = extract::extract_durations_from_file(path)?;
    let summary = summarize(&samples);
    Ok(DurationAnalysis {
        samples,
        summary,
        show_raw,
    })
}

impl fmt::Display for DurationAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_section(f, &self.samples, &self.summary, self.show_raw)
    }
}

/// Percentiles of the two delays derived from a structured record document.
#[derive(Clone, Debug)]
pub struct RecordAnalysis {
    pub samples: RecordSamples,
    pub added: Summary,
    pub confirmed: Summary,
    show_raw: bool,
}

pub fn analyze_records(document: &str, show_raw: bool) -> Result<RecordAnalysis, ExtractError> {
    Ok(RecordAnalysis::new(
        extract::extract_record_samples(document)?,
        show_raw,
    ))
}

pub fn analyze_records_file(
    path: impl AsRef<Path>,
    show_raw: bool,
) -> Result<RecordAnalysis, ExtractError> {
    Ok(RecordAnalysis::new(
        extract::extract_record_samples_from_file(path)?,
        show_raw,
    ))
}

impl RecordAnalysis {
    fn new(samples: RecordSamples, show_raw: bool) -> Self {
        let added = summarize(&samples.added_minus_created);
        let confirmed = summarize(&samples.confirmed_minus_added);
        Self {
            samples,
            added,
            confirmed,
            show_raw,
        }
    }
}

impl fmt::Display for RecordAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Transactions: {} ({} skipped, {} outliers)",
            self.samples.len(),
            self.samples.skipped,
            self.samples.outliers
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Percentiles for Time Difference (TimestampAdded - TimestampCreated) in ms:"
        )?;
        write_section(
            f,
            &self.samples.added_minus_created,
            &self.added,
            self.show_raw,
        )?;
        writeln!(f)?;
        writeln!(f)?;
        writeln!(
            f,
            "Percentiles for Time Difference (TimestampConfirmed - TimestampAdded) in ms:"
        )?;
        write_section(
            f,
            &self.samples.confirmed_minus_added,
            &self.confirmed,
            self.show_raw,
        )
    }
}
