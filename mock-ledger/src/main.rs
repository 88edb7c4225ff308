use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use mock_ledger::MockConfig;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about = "Mock ledger node for local load tests")]
struct Cli {
    #[arg(short, long, default_value_t = 8090)]
    port: u16,

    /// Mean delay before an accepted transaction becomes solid.
    #[arg(long, default_value = "1s")]
    confirm_mean: humantime::Duration,

    #[arg(long, default_value = "200ms")]
    confirm_std: humantime::Duration,

    /// Reject submissions beyond this rate with 503.
    #[arg(long)]
    max_tps: Option<NonZeroU32>,

    #[arg(long)]
    never_confirm: bool,

    /// Expose Prometheus metrics on this port.
    #[arg(long)]
    metrics_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_ledger=info,tower_http=info")),
        )
        .init();

    let args = Cli::parse();

    if let Some(port) = args.metrics_port {
        PrometheusBuilder::new()
            .with_http_listener(SocketAddr::from(([0, 0, 0, 0], port)))
            .install()?;
    }

    let config = MockConfig {
        confirm_mean: args.confirm_mean.into(),
        confirm_std: args.confirm_std.into(),
        max_tps: args.max_tps,
        never_confirm: args.never_confirm,
    };
    mock_ledger::run(SocketAddr::from(([0, 0, 0, 0], args.port)), config).await
}
