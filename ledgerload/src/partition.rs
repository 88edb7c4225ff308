//! Randomized split of a transaction budget across endpoints.
use crate::error::ConfigError;
use ledgerload_core::{Endpoint, PartitionBand, RunConfig};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fmt;
#[allow(unused)]
use tracing::{debug, info, trace};

/// Ordered `(endpoint, count)` pairs whose counts sum to the requested total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    shares: Vec<(Endpoint, u64)>,
}

impl Partition {
    pub fn shares(&self) -> &[(Endpoint, u64)] {
        &self.shares
    }

    pub fn counts(&self) -> impl Iterator<Item = u64> + '_ {
        self.shares.iter().map(|(_, count)| *count)
    }

    pub fn total(&self) -> u64 {
        self.counts().sum()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// Partition with externally decided counts, e.g. payloads already persisted per endpoint.
    pub fn from_counts(shares: Vec<(Endpoint, u64)>) -> Self {
        Self { shares }
    }
}

impl IntoIterator for Partition {
    type Item = (Endpoint, u64);
    type IntoIter = std::vec::IntoIter<(Endpoint, u64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.shares.into_iter()
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (endpoint, count)) in self.shares.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={count}", endpoint.label())?;
        }
        Ok(())
    }
}

/// Draws per-endpoint counts within a [`PartitionBand`].
///
/// Every endpoint but the last draws uniformly from the band's integer bounds, clamped to what is
/// still unassigned. The last endpoint absorbs the remainder, so the total is always conserved.
pub struct LoadPartitioner {
    band: PartitionBand,
    rng: StdRng,
}

impl LoadPartitioner {
    pub fn new(band: PartitionBand, seed: Option<u64>) -> Result<Self, ConfigError> {
        band.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { band, rng })
    }

    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        Self::new(config.band, config.seed)
    }

    pub fn partition(
        &mut self,
        total: u64,
        endpoints: &[Endpoint],
    ) -> Result<Partition, ConfigError> {
        let Some((last, head)) = endpoints.split_last() else {
            return Err(ConfigError::TooFewEndpoints(0));
        };
        if head.is_empty() {
            return Err(ConfigError::TooFewEndpoints(1));
        }

        let (lo, hi) = self.band.bounds(total);
        trace!("Drawing shares of {total} within [{lo}, {hi}]");

        let mut remaining = total;
        let mut shares = Vec::with_capacity(endpoints.len());
        for endpoint in head {
            let upper = hi.min(remaining);
            let lower = lo.min(upper);
            let count = self.rng.gen_range(lower..=upper);
            remaining -= count;
            shares.push((endpoint.clone(), count));
        }
        shares.push((last.clone(), remaining));

        let partition = Partition { shares };
        debug!("Partition of {total}: {partition}");
        Ok(partition)
    }
}

/// One-shot convenience wrapper around [`LoadPartitioner`].
pub fn partition(
    total: u64,
    endpoints: &[Endpoint],
    band: PartitionBand,
    seed: Option<u64>,
) -> Result<Partition, ConfigError> {
    LoadPartitioner::new(band, seed)?.partition(total, endpoints)
}
