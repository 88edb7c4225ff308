//! Mock of the ledger wallet/node API: submission, confirmation status and a DAG dump.
use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use ledgerload_core::TransactionKind;
#[allow(unused)]
use metrics::{counter, gauge, histogram};
use rand_distr::{Distribution, SkewNormal};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use time::{format_description::well_known::Rfc3339, macros::datetime, OffsetDateTime};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// Zero value for timestamps that have not happened yet.
const UNSET: OffsetDateTime = datetime!(0001-01-01 0:00 UTC);

#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Mean delay between acceptance and confirmation.
    pub confirm_mean: Duration,
    pub confirm_std: Duration,
    /// Submissions beyond this rate are answered with 503.
    pub max_tps: Option<NonZeroU32>,
    /// Accept transactions but never confirm them.
    pub never_confirm: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            confirm_mean: Duration::from_secs(1),
            confirm_std: Duration::from_millis(200),
            max_tps: None,
            never_confirm: false,
        }
    }
}

impl MockConfig {
    fn confirm_delay(&self) -> Duration {
        match SkewNormal::new(
            self.confirm_mean.as_secs_f64(),
            self.confirm_std.as_secs_f64(),
            20.,
        ) {
            Ok(dist) => {
                let secs: f64 = dist.sample(&mut rand::thread_rng()).max(0.);
                Duration::from_secs_f64(secs)
            }
            Err(_) => self.confirm_mean,
        }
    }
}

struct LedgerTransaction {
    from: String,
    to: String,
    token: f64,
    data: String,
    kind: TransactionKind,
    created: OffsetDateTime,
    added: OffsetDateTime,
    confirmed: Option<OffsetDateTime>,
}

impl LedgerTransaction {
    fn fee(&self) -> f64 {
        (self.data.len() as f64 / 10.).max(1.)
    }

    fn to_record(&self, id: &str) -> Value {
        json!({
            "ID": id,
            "From": self.from,
            "To": self.to,
            "Token": self.token,
            "Data": self.data,
            "Fee": self.fee(),
            "Type": self.kind,
            "Status": if self.confirmed.is_some() { "confirmed" } else { "pending" },
            "TimestampCreated": rfc3339(self.created),
            "TimestampAdded": rfc3339(self.added),
            "TimestampConfirmed": rfc3339(self.confirmed.unwrap_or(UNSET)),
        })
    }
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_default()
}

pub struct LedgerState {
    config: MockConfig,
    limiter: Option<DefaultDirectRateLimiter>,
    transactions: RwLock<HashMap<String, LedgerTransaction>>,
}

impl LedgerState {
    pub fn new(config: MockConfig) -> Self {
        let limiter = config
            .max_tps
            .map(|tps| RateLimiter::direct(Quota::per_second(tps)));
        Self {
            config,
            limiter,
            transactions: RwLock::new(HashMap::new()),
        }
    }

    fn confirm(&self, id: &str) {
        if let Some(tx) = self.transactions.write().unwrap().get_mut(id) {
            tx.confirmed = Some(OffsetDateTime::now_utc());
            debug!("Confirmed {id}");
        }
    }
}

pub fn router(state: Arc<LedgerState>) -> Router {
    Router::new()
        .route("/wallet/transaction", post(submit))
        .route("/node/transaction/:id", get(status))
        .route("/node/dag", get(dag))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr, config: MockConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Mock ledger listening on {}", listener.local_addr()?);
    axum::serve(listener, router(Arc::new(LedgerState::new(config)))).await?;
    Ok(())
}

/// Serve on an ephemeral local port in the background and return the bound address.
pub async fn spawn(config: MockConfig) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(Arc::new(LedgerState::new(config)));

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("Mock ledger on {addr} stopped: {err}");
        }
    });

    debug!("Mock ledger spawned on {addr}");
    Ok(addr)
}

#[derive(Deserialize)]
struct SubmitRequest {
    from: String,
    to: String,
    token: f64,
    data: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Serialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Serialize)]
struct StatusResponse {
    id: String,
    solid: bool,
}

type HandlerError = (StatusCode, Json<Value>);

fn reject(status: StatusCode, message: &str) -> HandlerError {
    counter!("mock-ledger.rejected").increment(1);
    (status, Json(json!({ "error": message })))
}

#[debug_handler]
async fn submit(
    State(state): State<Arc<LedgerState>>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, HandlerError> {
    let created = OffsetDateTime::now_utc();

    if req.to.len() != 64 {
        return Err(reject(StatusCode::BAD_REQUEST, "Invalid to address"));
    }
    let kind = match TransactionKind::ALL.iter().find(|k| k.as_str() == req.kind) {
        Some(kind) => *kind,
        None => return Err(reject(StatusCode::BAD_REQUEST, "Invalid transaction type")),
    };
    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            return Err(reject(StatusCode::SERVICE_UNAVAILABLE, "Node is overloaded"));
        }
    }

    let id = uuid::Uuid::new_v4().to_string();
    let tx = LedgerTransaction {
        from: req.from,
        to: req.to,
        token: req.token,
        data: req.data,
        kind,
        created,
        added: OffsetDateTime::now_utc(),
        confirmed: None,
    };
    state.transactions.write().unwrap().insert(id.clone(), tx);
    counter!("mock-ledger.submitted").increment(1);

    if !state.config.never_confirm {
        let delay = state.config.confirm_delay();
        histogram!("mock-ledger.confirm_delay").record(delay.as_secs_f64());
        let state = state.clone();
        let confirm_id = id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.confirm(&confirm_id);
        });
    }

    Ok(Json(SubmitResponse { id }))
}

#[debug_handler]
async fn status(
    State(state): State<Arc<LedgerState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, HandlerError> {
    let solid = match state.transactions.read().unwrap().get(&id) {
        Some(tx) => tx.confirmed.is_some(),
        None => return Err(reject(StatusCode::NOT_FOUND, "Unknown transaction")),
    };
    Ok(Json(StatusResponse { id, solid }))
}

#[debug_handler]
async fn dag(State(state): State<Arc<LedgerState>>) -> Json<Value> {
    let transactions: serde_json::Map<String, Value> = state
        .transactions
        .read()
        .unwrap()
        .iter()
        .map(|(id, tx)| (id.clone(), tx.to_record(id)))
        .collect();
    Json(json!({ "Transactions": transactions }))
}
