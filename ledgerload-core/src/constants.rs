use std::num::NonZeroUsize;
use std::time::Duration;

/// Worker tasks per endpoint when none is configured.
pub const DEFAULT_WORKERS: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(workers) => workers,
    None => panic!("default worker count must be non-zero"),
};

/// Interval between confirmation status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default lower bound of a single endpoint's share of the total.
pub const DEFAULT_MIN_PERCENT: f64 = 0.25;

/// Default upper bound of a single endpoint's share of the total.
pub const DEFAULT_MAX_PERCENT: f64 = 0.35;

/// Confirmation latencies above this (in milliseconds) are treated as stuck transactions.
pub const OUTLIER_CEILING_MS: f64 = 1_000_000.;

/// Ports used by the reference three-node deployment.
pub const DEFAULT_PORTS: [u16; 3] = [8090, 8092, 8094];

/// Address every generated transaction is paid from.
pub const ORIGIN_ADDRESS: &str = "9a27ad25d050b690b05d38e1cf20c71e8c5314cff5a936efc024a2b5e9b07f04";

/// Percentiles reported for every sample set.
pub const REPORTED_PERCENTILES: [f64; 4] = [50., 90., 95., 99.];
