use super::{ConfirmationStatus, LedgerClient};
use crate::error::ClientError;
use ledgerload_core::{Endpoint, TransactionSpec};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{instrument, trace};

const SUBMIT_PATH: &str = "wallet/transaction";
const STATUS_PATH: &str = "node/transaction/";
const DAG_PATH: &str = "node/dag";

#[derive(Deserialize)]
struct SubmitResponse {
    id: String,
}

/// JSON-over-HTTP client for the wallet/node API.
#[derive(Clone, Debug)]
pub struct HttpLedgerClient {
    client: Client,
}

impl HttpLedgerClient {
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Download the endpoint's DAG dump, the structured record document used for post-hoc analysis.
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn fetch_dag(&self, endpoint: &Endpoint) -> Result<String, ClientError> {
        let res = self.client.get(endpoint.join(DAG_PATH)?).send().await?;
        Ok(check(res).await?.text().await?)
    }
}

impl LedgerClient for HttpLedgerClient {
    async fn submit(
        &self,
        endpoint: &Endpoint,
        spec: &TransactionSpec,
    ) -> Result<String, ClientError> {
        let res = self
            .client
            .post(endpoint.join(SUBMIT_PATH)?)
            .json(spec)
            .send()
            .await?;
        let body: SubmitResponse = check(res).await?.json().await?;
        trace!("Submitted {} to {endpoint}", body.id);
        Ok(body.id)
    }

    async fn status(&self, endpoint: &Endpoint, id: &str) -> Result<ConfirmationStatus, ClientError> {
        let url = endpoint.join(STATUS_PATH)?.join(id)?;
        let res = self.client.get(url).send().await?;
        Ok(check(res).await?.json().await?)
    }
}

async fn check(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        let body = res.text().await.unwrap_or_default();
        Err(ClientError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
