//! Random transaction payloads.
use crate::partition::Partition;
use ledgerload_core::{Endpoint, RunConfig, TransactionKind, TransactionSpec, ORIGIN_ADDRESS};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde_json::json;
use tokio::time::Instant;

const IOT_DEVICES: [&str; 5] = ["temperature", "humidity", "motion", "light", "pressure"];
const MAX_TOKEN: f64 = 0.1;

pub struct TransactionGenerator {
    rng: StdRng,
}

impl TransactionGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Seeded from the run seed, offset by one from the partitioner's stream.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.seed.map(|seed| seed.wrapping_add(1)))
    }

    pub fn generate(&mut self) -> TransactionSpec {
        let to: [u8; 32] = self.rng.gen();
        let token = (self.rng.gen_range(0.0..=MAX_TOKEN) * 1e4).round() / 1e4;
        let kind = *TransactionKind::ALL
            .choose(&mut self.rng)
            .unwrap_or(&TransactionKind::Standard);

        TransactionSpec {
            from: ORIGIN_ADDRESS.to_string(),
            to: hex(&to),
            token,
            data: self.sensor_reading(),
            kind,
            created: Instant::now(),
        }
    }

    pub fn batch(&mut self, count: usize) -> Vec<TransactionSpec> {
        (0..count).map(|_| self.generate()).collect()
    }

    /// One batch per endpoint, sized by its share of `partition`.
    pub fn for_partition(&mut self, partition: &Partition) -> Vec<(Endpoint, Vec<TransactionSpec>)> {
        partition
            .shares()
            .iter()
            .map(|(endpoint, count)| (endpoint.clone(), self.batch(*count as usize)))
            .collect()
    }

    fn sensor_reading(&mut self) -> String {
        let id = uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid();
        let device = IOT_DEVICES[self.rng.gen_range(0..IOT_DEVICES.len())];
        let value: u32 = self.rng.gen_range(1..=100);
        json!({ "id": id.to_string(), "type": device, "value": value }).to_string()
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
