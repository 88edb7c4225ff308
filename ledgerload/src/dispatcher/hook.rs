use super::Outcome;

#[cfg(feature = "metrics")]
pub(crate) fn describe() {
    metrics::describe_histogram!(
        "ledgerload.submit_latency",
        metrics::Unit::Seconds,
        "Time from submission start until the endpoint returned an identifier"
    );
    metrics::describe_histogram!(
        "ledgerload.confirm_latency",
        metrics::Unit::Seconds,
        "Time from submission start until the transaction was reported solid"
    );
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn describe() {}

#[cfg(feature = "metrics")]
pub(crate) fn record(outcome: &Outcome) {
    match outcome {
        Outcome::Confirmed(record) => {
            let endpoint = record.endpoint.label();
            metrics::histogram!("ledgerload.submit_latency", "endpoint" => endpoint.clone())
                .record(record.submit_duration().as_secs_f64());
            metrics::histogram!("ledgerload.confirm_latency", "endpoint" => endpoint.clone())
                .record(record.total_duration().as_secs_f64());
            metrics::counter!("ledgerload.success", "endpoint" => endpoint).increment(1);
        }
        Outcome::Failed(failure) => {
            metrics::counter!(
                "ledgerload.error",
                "endpoint" => failure.endpoint.label(),
                "class" => failure.error.class()
            )
            .increment(1);
        }
    }
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record(_outcome: &Outcome) {}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;
    use crate::dispatcher::FailedTransaction;
    use crate::error::TransactionError;
    use ledgerload_core::{Endpoint, TimingRecord};
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use std::time::Duration;
    use time::OffsetDateTime;
    use tokio::time::Instant;

    #[test]
    fn outcomes_feed_histograms_and_counters() {
        let endpoint = Endpoint::local(8090);
        let submitted = Instant::now();
        let confirmed = Outcome::Confirmed(TimingRecord {
            index: 0,
            endpoint: endpoint.clone(),
            transaction_id: "tx-0".to_string(),
            created: submitted,
            submitted,
            accepted: submitted + Duration::from_millis(250),
            confirmed: submitted + Duration::from_secs(2),
            submitted_at: OffsetDateTime::now_utc(),
        });
        let failed = Outcome::Failed(FailedTransaction {
            index: 1,
            endpoint,
            transaction_id: None,
            submit_duration: None,
            error: TransactionError::Cancelled,
        });

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || {
            record(&confirmed);
            record(&failed);
            record(&failed);
        });

        let mut snapshot = snapshotter.snapshot().into_vec();
        let mut value = |name: &str| {
            snapshot
                .iter()
                .position(|(key, ..)| key.key().name() == name)
                .map(|i| snapshot.swap_remove(i).3)
        };

        assert_eq!(value("ledgerload.success"), Some(DebugValue::Counter(1)));
        assert_eq!(value("ledgerload.error"), Some(DebugValue::Counter(2)));
        match value("ledgerload.confirm_latency") {
            Some(DebugValue::Histogram(samples)) => {
                assert_eq!(samples.len(), 1);
                assert!((samples[0].into_inner() - 2.).abs() < 1e-9);
            }
            other => panic!("unexpected confirm latency: {other:?}"),
        }
    }
}
