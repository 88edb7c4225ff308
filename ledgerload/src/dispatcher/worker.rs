use super::{DispatchConfig, FailedTransaction, Job, Outcome, Shutdown};
use crate::client::LedgerClient;
use crate::error::TransactionError;
use async_channel::{Receiver, Sender};
use ledgerload_core::{Endpoint, TimingRecord};
use std::sync::Arc;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tokio::time::{interval, Instant, MissedTickBehavior};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// One slot of an endpoint's worker pool. Processes its jobs strictly one at a time.
pub(crate) struct Worker<C> {
    pub id: usize,
    pub client: Arc<C>,
    pub endpoint: Endpoint,
    pub config: DispatchConfig,
    pub shutdown: Shutdown,
}

impl<C> Worker<C>
where
    C: LedgerClient + Send + Sync + 'static,
{
    pub async fn run(mut self, jobs: Receiver<Job>, outcomes: Sender<Outcome>) {
        while let Ok(job) = jobs.recv().await {
            let outcome = self.process(job).await;
            super::hook::record(&outcome);
            if outcomes.send(outcome).await.is_err() {
                error!("Outcome collector closed; worker {} exiting.", self.id);
                break;
            }
        }
        trace!("Worker {} drained its queue.", self.id);
    }

    async fn process(&mut self, job: Job) -> Outcome {
        let Job { index, spec } = job;

        if self.shutdown.is_triggered() {
            return self.failed(index, None, None, TransactionError::Cancelled);
        }

        let submitted_at = OffsetDateTime::now_utc();
        let submitted = Instant::now();
        let id = match self.client.submit(&self.endpoint, &spec).await {
            Ok(id) => id,
            Err(err) => {
                warn!("Transaction {index} rejected by {}: {err}", self.endpoint);
                return self.failed(index, None, None, TransactionError::Submission(err));
            }
        };
        let accepted = Instant::now();
        trace!("Transaction {index} accepted as {id}");

        match self.wait_for_confirmation(&id).await {
            Ok(confirmed) => {
                let record = TimingRecord {
                    index,
                    endpoint: self.endpoint.clone(),
                    transaction_id: id,
                    created: spec.created,
                    submitted,
                    accepted,
                    confirmed,
                    submitted_at,
                };
                debug!(
                    "Transaction {} submitted at {} after {:?} queued, solid after {:?}",
                    record.transaction_id,
                    submitted_at.format(&Rfc3339).unwrap_or_default(),
                    record.queued(),
                    record.total_duration()
                );
                Outcome::Confirmed(record)
            }
            Err(err) => {
                warn!("Transaction {id} not confirmed: {err}");
                let submit = accepted.saturating_duration_since(submitted);
                self.failed(index, Some(id), Some(submit), err)
            }
        }
    }

    async fn wait_for_confirmation(&mut self, id: &str) -> Result<Instant, TransactionError> {
        match self.config.confirm_timeout {
            Some(limit) => tokio::time::timeout(limit, self.poll_until_solid(id))
                .await
                .map_err(|_| TransactionError::ConfirmationTimeout(limit))?,
            None => self.poll_until_solid(id).await,
        }
    }

    async fn poll_until_solid(&mut self, id: &str) -> Result<Instant, TransactionError> {
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // NOTE: The first tick completes immediately, so the first status query follows the
            // submission without waiting.
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.shutdown.triggered() => return Err(TransactionError::Cancelled),
            }

            match self.client.status(&self.endpoint, id).await {
                Ok(status) if status.solid => return Ok(Instant::now()),
                Ok(_) => trace!("Transaction {id} not solid yet"),
                Err(err) => debug!("Status query for {id} failed, retrying: {err}"),
            }
        }
    }

    fn failed(
        &self,
        index: usize,
        transaction_id: Option<String>,
        submit_duration: Option<std::time::Duration>,
        error: TransactionError,
    ) -> Outcome {
        Outcome::Failed(FailedTransaction {
            index,
            endpoint: self.endpoint.clone(),
            transaction_id,
            submit_duration,
            error,
        })
    }
}
