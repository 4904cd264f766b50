//! Direct JSON-RPC endpoints.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use super::transport::{RpcFailure, codes};

/// Default per-request timeout for direct endpoints.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// A single JSON-RPC connection.
#[async_trait]
pub trait JsonRpcEndpoint: Send + Sync + fmt::Debug {
    /// Endpoint label used in logs.
    fn label(&self) -> &str;

    /// Sends one JSON-RPC request and returns its `result`.
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcFailure>;
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    code: i64,
    #[serde(default)]
    message: String,
}

/// JSON-RPC endpoint over HTTP(S) POST.
///
/// The timeout is owned by the underlying client; the endpoint keeps no state
/// between calls beyond a monotonically increasing request id.
#[derive(Debug)]
pub struct HttpEndpoint {
    url: Url,
    label: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpEndpoint {
    /// Creates an endpoint sharing `client`.
    #[must_use]
    pub fn new(url: Url, client: reqwest::Client) -> Self {
        let label = url.host_str().unwrap_or_else(|| url.as_str()).to_owned();
        Self {
            url,
            label,
            client,
            next_id: AtomicU64::new(1),
        }
    }

    /// Endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    fn transport_failure(&self, err: &reqwest::Error) -> RpcFailure {
        let condition = if err.is_timeout() {
            "connection timed out"
        } else if err.is_connect() {
            "connection error"
        } else if err.is_decode() {
            "malformed response"
        } else {
            "request failed"
        };
        RpcFailure::with_message(format!("{condition} ({}): {err}", self.label))
    }
}

#[async_trait]
impl JsonRpcEndpoint for HttpEndpoint {
    fn label(&self) -> &str {
        &self.label
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcFailure> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        tracing::trace!(endpoint = %self.label, method, id, "sending JSON-RPC request");

        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_failure(&e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RpcFailure::new(
                codes::RATE_LIMITED,
                format!("HTTP status {status} from {}", self.label),
            ));
        }
        if !status.is_success() {
            return Err(RpcFailure::with_message(format!(
                "HTTP status {status} from {}",
                self.label
            )));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| self.transport_failure(&e))?;
        match envelope {
            Envelope {
                error: Some(error), ..
            } => Err(RpcFailure::new(error.code, error.message)),
            Envelope {
                result: Some(result),
                ..
            } => Ok(result),
            Envelope { result: None, .. } => Ok(Value::Null),
        }
    }
}

/// Builds the HTTP client shared by all direct endpoints.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] if the TLS backend cannot be
/// initialised.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}
