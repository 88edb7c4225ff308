mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;

    use ledgerload::generator::TransactionGenerator;
    use ledgerload::prelude::*;
    use ledgerload::reporter::analyze_records;
    use ledgerload::{store, LoadPartitioner};
    use ledgerload_core::LatencyKind;
    use mock_ledger::MockConfig;
    use std::num::NonZeroUsize;
    use std::sync::Arc;
    use std::time::Duration;

    async fn three_ledgers() -> Vec<Endpoint> {
        let mut endpoints = vec![];
        for _ in 0..3 {
            endpoints.push(spawn_ledger(confirming_after(Duration::from_millis(200))).await);
        }
        endpoints
    }

    fn config(total: u64, endpoints: Vec<Endpoint>) -> RunConfig {
        let mut config = RunConfig::new(total, endpoints);
        config.seed = Some(42);
        config.workers = NonZeroUsize::new(5).unwrap();
        config.poll_interval = Duration::from_millis(50);
        config.confirm_timeout = Some(Duration::from_secs(10));
        config.submit_timeout = Some(Duration::from_secs(5));
        config
    }

    #[tokio::test]
    #[ntest::timeout(60_000)]
    async fn end_to_end_run_and_dag_analysis() {
        init();
        let config = config(60, three_ledgers().await);
        let client = Arc::new(HttpLedgerClient::new(config.submit_timeout).unwrap());

        let report = RunReporter::new(config.clone(), client.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(report.partition.total(), 60);
        assert_eq!(report.confirmed(), 60);
        assert_eq!(report.failed(), 0);
        let total = report.latency(LatencyKind::Total).unwrap();
        assert_eq!(total.summary.count(), 60);
        assert!(total.summary.report().unwrap().p50 >= 200.);

        let text = report.to_string();
        assert!(text.contains("Total time for 60 transactions"));
        assert!(text.contains("Average transaction confirmation time"));

        for (endpoint, count) in report.partition.shares() {
            let dump = client.fetch_dag(endpoint).await.unwrap();
            let analysis = analyze_records(&dump, false).unwrap();
            assert_eq!(analysis.samples.len() as u64, *count);
            assert_eq!(analysis.samples.skipped, 0);
            if *count > 0 {
                assert!(analysis.confirmed.report().unwrap().p50 >= 200.);
            }
        }
    }

    #[tokio::test]
    #[ntest::timeout(60_000)]
    async fn generated_payloads_can_be_replayed() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let config = config(30, three_ledgers().await);

        let partition = LoadPartitioner::from_config(&config)
            .unwrap()
            .partition(config.total, &config.endpoints)
            .unwrap();
        let batches = TransactionGenerator::from_config(&config).for_partition(&partition);
        for (endpoint, specs) in &batches {
            store::write_payloads(dir.path(), &endpoint.label(), specs).unwrap();
        }

        let client = Arc::new(HttpLedgerClient::new(None).unwrap());
        let report = RunReporter::new(config, client)
            .run_stored(dir.path())
            .await
            .unwrap();

        assert_eq!(
            report.partition.counts().collect::<Vec<_>>(),
            partition.counts().collect::<Vec<_>>()
        );
        assert_eq!(report.confirmed(), 30);
    }

    #[tokio::test]
    #[ntest::timeout(30_000)]
    async fn saved_dag_dump_is_analyzed() {
        init();
        let endpoint = spawn_ledger(MockConfig {
            never_confirm: true,
            ..Default::default()
        })
        .await;
        let client = HttpLedgerClient::new(None).unwrap();
        for spec in TransactionGenerator::new(Some(5)).batch(4) {
            client.submit(&endpoint, &spec).await.unwrap();
        }

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), client.fetch_dag(&endpoint).await.unwrap()).unwrap();

        let analysis = analyze_records_file(file.path(), false).unwrap();
        // Unconfirmed transactions carry the zero timestamp, so every pair is an outlier.
        assert_eq!(analysis.samples.outliers, 4);
        assert!(analysis.confirmed.is_no_data());
        assert!(analysis.to_string().contains("No Duration data found."));
    }
}
