use ledgerload_core::Endpoint;
use mock_ledger::MockConfig;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter("ledgerload=debug,mock_ledger=debug,axum::rejection=trace")
            .with_test_writer()
            .try_init();
    });
}

/// Boot a mock ledger on an ephemeral port and return it as an endpoint.
#[allow(unused)]
pub async fn spawn_ledger(config: MockConfig) -> Endpoint {
    let addr = mock_ledger::spawn(config).await.unwrap();
    format!("http://{addr}").parse().unwrap()
}

/// A mock that confirms after a fixed delay.
#[allow(unused)]
pub fn confirming_after(delay: Duration) -> MockConfig {
    MockConfig {
        confirm_mean: delay,
        confirm_std: Duration::ZERO,
        ..Default::default()
    }
}
