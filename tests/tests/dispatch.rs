mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;

    use ledgerload::dispatcher::{DispatchConfig, TransactionDispatcher};
    use ledgerload::error::{ClientError, TransactionError};
    use ledgerload::generator::TransactionGenerator;
    use ledgerload::HttpLedgerClient;
    use mock_ledger::MockConfig;
    use std::num::NonZeroU32;
    use std::num::NonZeroUsize;
    use std::sync::Arc;
    use std::time::Duration;

    fn dispatcher(workers: usize, confirm_timeout: Duration) -> TransactionDispatcher<HttpLedgerClient> {
        let client = HttpLedgerClient::new(Some(Duration::from_secs(5))).unwrap();
        TransactionDispatcher::new(
            Arc::new(client),
            DispatchConfig {
                workers: NonZeroUsize::new(workers).unwrap(),
                poll_interval: Duration::from_millis(100),
                confirm_timeout: Some(confirm_timeout),
            },
        )
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn confirms_over_http() {
        init();
        let endpoint = spawn_ledger(confirming_after(Duration::from_millis(300))).await;
        let specs = TransactionGenerator::new(Some(1)).batch(20);

        let outcome = dispatcher(4, Duration::from_secs(10))
            .dispatch(endpoint.clone(), specs)
            .await;

        assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
        assert_eq!(outcome.records.len(), 20);
        for record in &outcome.records {
            assert_eq!(record.endpoint, endpoint);
            assert!(record.total_duration() >= Duration::from_millis(300));
            assert!(record.submit_duration() < record.total_duration());
        }
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn rate_limited_submissions_are_classified() {
        init();
        let endpoint = spawn_ledger(MockConfig {
            max_tps: NonZeroU32::new(5),
            ..confirming_after(Duration::from_millis(50))
        })
        .await;
        let specs = TransactionGenerator::new(Some(2)).batch(30);

        let outcome = dispatcher(10, Duration::from_secs(10))
            .dispatch(endpoint, specs)
            .await;

        assert_eq!(outcome.dispatched(), 30);
        assert!(!outcome.failures.is_empty());
        assert!(!outcome.records.is_empty());
        for failure in &outcome.failures {
            assert!(matches!(
                failure.error,
                TransactionError::Submission(ClientError::Rejected { status: 503, .. })
            ));
        }
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn unconfirmed_transactions_time_out() {
        init();
        let endpoint = spawn_ledger(MockConfig {
            never_confirm: true,
            ..Default::default()
        })
        .await;
        let specs = TransactionGenerator::new(Some(3)).batch(6);

        let outcome = dispatcher(3, Duration::from_millis(500))
            .dispatch(endpoint, specs)
            .await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failure_counts().get("confirmation-timeout"), Some(&6));
        assert!(outcome.failures.iter().all(|f| f.transaction_id.is_some()));
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn invalid_payloads_are_rejected() {
        init();
        let endpoint = spawn_ledger(MockConfig::default()).await;
        let mut specs = TransactionGenerator::new(Some(4)).batch(5);
        for spec in &mut specs {
            spec.to = "not-an-address".to_string();
        }

        let outcome = dispatcher(2, Duration::from_secs(5))
            .dispatch(endpoint, specs)
            .await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failures.len(), 5);
        for failure in &outcome.failures {
            assert!(matches!(
                failure.error,
                TransactionError::Submission(ClientError::Rejected { status: 400, .. })
            ));
        }
    }
}
