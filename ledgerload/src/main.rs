use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use ledgerload::generator::TransactionGenerator;
use ledgerload::prelude::*;
use ledgerload::reporter::{analyze_records, RecordAnalysis};
use ledgerload::{store, LoadPartitioner, Partition};
use ledgerload_core::DEFAULT_PORTS;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about = "Load-test harness for DAG-ledger nodes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Partition, generate, dispatch and report against live endpoints.
    Run {
        #[command(flatten)]
        load: LoadArgs,

        #[command(flatten)]
        dispatch: DispatchArgs,

        /// Dispatch payloads written by `generate` instead of generating new ones.
        #[arg(long)]
        payloads: Option<PathBuf>,

        /// Print every sample alongside the percentiles.
        #[arg(long)]
        raw: bool,
    },

    /// Print a partition of the total across the endpoints.
    Partition {
        #[command(flatten)]
        load: LoadArgs,
    },

    /// Partition the total and write one payload file per transaction.
    Generate {
        #[command(flatten)]
        load: LoadArgs,

        #[arg(short, long)]
        out: PathBuf,
    },

    /// Summarize `Duration [total, attack, wait]` lines from a text report.
    Durations {
        file: PathBuf,

        #[arg(long)]
        raw: bool,
    },

    /// Summarize record timestamps from a DAG dump, read from a file or fetched from an endpoint.
    Dag {
        #[arg(required_unless_present = "endpoint")]
        file: Option<PathBuf>,

        #[arg(short, long, conflicts_with = "file")]
        endpoint: Option<Endpoint>,

        /// Keep a copy of the fetched dump.
        #[arg(long, requires = "endpoint")]
        save: Option<PathBuf>,

        #[arg(long)]
        raw: bool,
    },
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// JSON run configuration. Flags given alongside it take precedence.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    total: Option<u64>,

    /// Endpoint as a bare local port or a full URL. Repeat for each endpoint.
    #[arg(short, long = "endpoint")]
    endpoints: Vec<Endpoint>,

    #[arg(long)]
    min_percent: Option<f64>,

    #[arg(long)]
    max_percent: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,
}

impl LoadArgs {
    fn into_config(self) -> Result<RunConfig> {
        self.into_config_with(true)
    }

    /// Stored payloads already fix the partition, so replaying them needs no total.
    fn into_config_with(self, require_total: bool) -> Result<RunConfig> {
        let mut config = match self.config {
            Some(path) => RunConfig::from_file(&path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => {
                let total = match self.total {
                    Some(total) => total,
                    None if !require_total => 0,
                    None => return Err(anyhow!("--total is required without --config")),
                };
                RunConfig::new(total, DEFAULT_PORTS.map(Endpoint::local).to_vec())
            }
        };

        if let Some(total) = self.total {
            config.total = total;
        }
        if !self.endpoints.is_empty() {
            config.endpoints = self.endpoints;
        }
        if let Some(min_percent) = self.min_percent {
            config.band.min_percent = min_percent;
        }
        if let Some(max_percent) = self.max_percent {
            config.band.max_percent = max_percent;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
struct DispatchArgs {
    /// Concurrent workers per endpoint.
    #[arg(short, long)]
    workers: Option<NonZeroUsize>,

    #[arg(long)]
    poll_interval: Option<humantime::Duration>,

    /// Give up on a transaction that is not confirmed within this long.
    #[arg(long)]
    confirm_timeout: Option<humantime::Duration>,

    /// Per-request HTTP timeout.
    #[arg(long)]
    submit_timeout: Option<humantime::Duration>,
}

impl DispatchArgs {
    fn apply(self, config: &mut RunConfig) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(interval) = self.poll_interval {
            config.poll_interval = interval.into();
        }
        if let Some(timeout) = self.confirm_timeout {
            config.confirm_timeout = Some(timeout.into());
        }
        if let Some(timeout) = self.submit_timeout {
            config.submit_timeout = Some(timeout.into());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ledgerload=info")),
        )
        .init();

    match Cli::parse().command {
        Command::Run {
            load,
            dispatch,
            payloads,
            raw,
        } => {
            let mut config = load.into_config_with(payloads.is_none())?;
            dispatch.apply(&mut config);
            config.show_raw |= raw;
            run(config, payloads).await?;
        }
        Command::Partition { load } => {
            let config = load.into_config()?;
            let partition = LoadPartitioner::from_config(&config)?
                .partition(config.total, &config.endpoints)?;
            print_partition(&partition);
        }
        Command::Generate { load, out } => {
            let config = load.into_config()?;
            let partition = LoadPartitioner::from_config(&config)?
                .partition(config.total, &config.endpoints)?;
            print_partition(&partition);

            let batches = TransactionGenerator::from_config(&config).for_partition(&partition);
            for (endpoint, specs) in batches {
                store::write_payloads(&out, &endpoint.label(), &specs)?;
            }
        }
        Command::Durations { file, raw } => {
            println!("{}", analyze_durations_file(&file, raw)?);
        }
        Command::Dag {
            file,
            endpoint,
            save,
            raw,
        } => {
            println!("{}", dag(file, endpoint, save, raw).await?);
        }
    }

    Ok(())
}

async fn run(config: RunConfig, payloads: Option<PathBuf>) -> Result<()> {
    let client = Arc::new(HttpLedgerClient::new(config.submit_timeout)?);
    let (handle, shutdown) = shutdown_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling outstanding transactions");
            handle.trigger();
        }
    });

    let reporter = RunReporter::new(config, client).with_shutdown(shutdown);
    let report = match payloads {
        Some(dir) => reporter.run_stored(&dir).await?,
        None => reporter.run().await?,
    };
    println!("{report}");
    Ok(())
}

async fn dag(
    file: Option<PathBuf>,
    endpoint: Option<Endpoint>,
    save: Option<PathBuf>,
    raw: bool,
) -> Result<RecordAnalysis> {
    let Some(endpoint) = endpoint else {
        let file = file.ok_or_else(|| anyhow!("either a file or --endpoint is required"))?;
        return Ok(analyze_records_file(&file, raw)?);
    };

    let document = HttpLedgerClient::new(None)?.fetch_dag(&endpoint).await?;
    if let Some(path) = save {
        tokio::fs::write(&path, &document)
            .await
            .with_context(|| format!("saving DAG dump to {}", path.display()))?;
        info!("Saved DAG dump from {endpoint} to {}", path.display());
    }
    Ok(analyze_records(&document, raw)?)
}

fn print_partition(partition: &Partition) {
    for (endpoint, count) in partition.shares() {
        println!("{endpoint}: {count}");
    }
    println!("Total: {}", partition.total());
}
