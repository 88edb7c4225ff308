use super::{ConfirmationStatus, LedgerClient};
use crate::error::ClientError;
use ledgerload_core::{Endpoint, TransactionSpec};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory client with scripted latencies, rejections and confirmation behavior.
#[derive(Debug, Default)]
pub(crate) struct ScriptedClient {
    pub submit_latency: Duration,
    pub polls_until_solid: usize,
    pub reject_every: Option<usize>,
    pub never_solid: bool,
    submissions: AtomicUsize,
    polls: Mutex<HashMap<String, usize>>,
}

impl ScriptedClient {
    pub fn confirming(submit_latency: Duration, polls_until_solid: usize) -> Self {
        Self {
            submit_latency,
            polls_until_solid,
            ..Default::default()
        }
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn total_polls(&self) -> usize {
        self.polls.lock().unwrap().values().sum()
    }
}

impl LedgerClient for ScriptedClient {
    async fn submit(
        &self,
        endpoint: &Endpoint,
        _spec: &TransactionSpec,
    ) -> Result<String, ClientError> {
        tokio::time::sleep(self.submit_latency).await;
        let n = self.submissions.fetch_add(1, Ordering::SeqCst);
        if let Some(every) = self.reject_every {
            if n % every == 0 {
                return Err(ClientError::Rejected {
                    status: 503,
                    body: "busy".to_string(),
                });
            }
        }
        Ok(format!("{}-{n}", endpoint.label()))
    }

    async fn status(&self, _endpoint: &Endpoint, id: &str) -> Result<ConfirmationStatus, ClientError> {
        let mut polls = self.polls.lock().unwrap();
        let count = polls.entry(id.to_string()).or_insert(0);
        *count += 1;
        Ok(ConfirmationStatus {
            solid: !self.never_solid && *count >= self.polls_until_solid,
        })
    }
}
