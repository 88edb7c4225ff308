use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::time::Instant;
use url::Url;

#[derive(Debug, Error)]
pub enum EndpointParseError {
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("endpoint URL has no host: {0}")]
    NoHost(String),
}

/// A single target service instance.
///
/// Parses either from a bare port (`8090`, which targets `127.0.0.1`) or from a full base URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    pub fn new(mut url: Url) -> Result<Self, EndpointParseError> {
        if url.host().is_none() {
            return Err(EndpointParseError::NoHost(url.to_string()));
        }
        // NOTE: `Url::join` replaces the last path segment unless the base ends with a slash.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self { url })
    }

    pub fn local(port: u16) -> Self {
        Self {
            url: Url::parse(&format!("http://127.0.0.1:{port}/"))
                .expect("loopback URL with numeric port is always valid"),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn join(&self, path: &str) -> Result<Url, url::ParseError> {
        self.url.join(path)
    }

    /// Short label used in file names and metric labels: the port when present, the host otherwise.
    pub fn label(&self) -> String {
        match self.url.port_or_known_default() {
            Some(port) => port.to_string(),
            None => self.url.host_str().unwrap_or("endpoint").to_string(),
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(port) = s.parse::<u16>() {
            return Ok(Self::local(port));
        }
        Self::new(Url::parse(s)?)
    }
}

impl TryFrom<String> for Endpoint {
    type Error = EndpointParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.url.into()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "transaction-standard")]
    Standard,
    #[serde(rename = "transaction-fast")]
    Fast,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 2] = [TransactionKind::Standard, TransactionKind::Fast];

    /// Wire name, as sent in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Standard => "transaction-standard",
            TransactionKind::Fast => "transaction-fast",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction payload as submitted to a wallet endpoint.
///
/// `created` is the monotonic instant the payload was built (or loaded) and is never serialized.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionSpec {
    pub from: String,
    pub to: String,
    pub token: f64,
    pub data: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(skip, default = "Instant::now")]
    pub created: Instant,
}

/// Timing of one confirmed transaction.
///
/// Instants are monotonic and only used for duration math. `submitted_at` is wall-clock and only
/// used for display.
#[derive(Clone, Debug)]
pub struct TimingRecord {
    pub index: usize,
    pub endpoint: Endpoint,
    pub transaction_id: String,
    pub created: Instant,
    pub submitted: Instant,
    pub accepted: Instant,
    pub confirmed: Instant,
    pub submitted_at: OffsetDateTime,
}

impl TimingRecord {
    /// Time between building the payload and handing it to the endpoint.
    pub fn queued(&self) -> Duration {
        self.submitted.saturating_duration_since(self.created)
    }

    pub fn submit_duration(&self) -> Duration {
        self.accepted.saturating_duration_since(self.submitted)
    }

    pub fn confirm_duration(&self) -> Duration {
        self.confirmed.saturating_duration_since(self.accepted)
    }

    pub fn total_duration(&self) -> Duration {
        self.confirmed.saturating_duration_since(self.submitted)
    }

    pub fn samples(&self) -> [LatencySample; 3] {
        [
            LatencySample::new(LatencyKind::Submit, self.submit_duration()),
            LatencySample::new(LatencyKind::Confirm, self.confirm_duration()),
            LatencySample::new(LatencyKind::Total, self.total_duration()),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LatencyKind {
    Submit,
    Confirm,
    Total,
}

impl fmt::Display for LatencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LatencyKind::Submit => "submit",
            LatencyKind::Confirm => "confirm",
            LatencyKind::Total => "total",
        };
        f.write_str(name)
    }
}

/// A single latency measurement in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatencySample {
    pub kind: LatencyKind,
    pub millis: f64,
}

impl LatencySample {
    pub fn new(kind: LatencyKind, duration: Duration) -> Self {
        Self {
            kind,
            millis: duration.as_secs_f64() * 1e3,
        }
    }
}
