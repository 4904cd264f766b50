//! Request channels: wallet pass-through or quorum-of-1 over direct endpoints.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::endpoint::JsonRpcEndpoint;
use super::transport::{InjectedTransport, RpcFailure};

/// Aggregation over redundant endpoints that accepts the first successful
/// answer.
///
/// Every request goes to all endpoints concurrently. The request fails only
/// when every endpoint fails, in which case the primary endpoint's failure is
/// reported. Dropping the request future aborts the outstanding calls.
#[derive(Debug, Clone)]
pub struct QuorumChannel {
    endpoints: Arc<[Arc<dyn JsonRpcEndpoint>]>,
}

impl QuorumChannel {
    /// Creates a channel over `endpoints`, primary first.
    ///
    /// # Panics
    ///
    /// Panics if `endpoints` is empty.
    #[must_use]
    pub fn new(endpoints: Vec<Arc<dyn JsonRpcEndpoint>>) -> Self {
        assert!(!endpoints.is_empty(), "quorum channel needs at least one endpoint");
        Self {
            endpoints: endpoints.into(),
        }
    }

    /// Number of underlying endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always `false`; construction rejects empty endpoint lists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Sends `method` to every endpoint and returns the first success.
    ///
    /// # Errors
    ///
    /// Returns the primary endpoint's failure when all endpoints fail.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcFailure> {
        let mut calls = JoinSet::new();
        for (index, endpoint) in self.endpoints.iter().enumerate() {
            let endpoint = Arc::clone(endpoint);
            let method = method.to_owned();
            let params = params.clone();
            calls.spawn(async move { (index, endpoint.call(&method, params).await) });
        }

        let mut failures: Vec<Option<RpcFailure>> = vec![None; self.endpoints.len()];
        while let Some(joined) = calls.join_next().await {
            let (index, outcome) = match joined {
                Ok(done) => done,
                Err(err) => {
                    tracing::warn!(%err, method, "endpoint task ended abnormally");
                    continue;
                }
            };
            match outcome {
                Ok(result) => {
                    tracing::debug!(
                        endpoint = self.endpoints[index].label(),
                        method,
                        "endpoint answered"
                    );
                    return Ok(result);
                }
                Err(failure) => {
                    tracing::debug!(
                        endpoint = self.endpoints[index].label(),
                        method,
                        %failure,
                        "endpoint failed"
                    );
                    failures[index] = Some(failure);
                }
            }
        }

        tracing::warn!(method, endpoints = self.endpoints.len(), "all endpoints failed");
        Err(failures
            .into_iter()
            .flatten()
            .next()
            .unwrap_or_else(|| RpcFailure::with_message("all RPC endpoints failed")))
    }
}

/// Request channel handed to callers.
///
/// Cheap to clone and reusable across requests. Either forwards everything
/// to a wallet-injected transport, which does its own endpoint selection, or
/// fans out to direct endpoints through a [`QuorumChannel`].
#[derive(Debug, Clone)]
pub enum ConnectionChannel {
    /// Single-source channel through the wallet.
    Injected(Arc<dyn InjectedTransport>),
    /// Quorum-of-1 over direct JSON-RPC endpoints.
    Direct(QuorumChannel),
}

impl ConnectionChannel {
    /// Sends a JSON-RPC request through the channel.
    ///
    /// # Errors
    ///
    /// Returns the raw [`RpcFailure`]; pass it to
    /// [`classify`](crate::classify::classify) before showing it to anyone.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcFailure> {
        match self {
            Self::Injected(wallet) => wallet.request(method, params).await,
            Self::Direct(quorum) => quorum.request(method, params).await,
        }
    }

    /// Like [`request`](Self::request), but gives up when `token` is
    /// cancelled. The abandoned request is dropped and reported as
    /// [`RpcFailure::cancelled`].
    ///
    /// # Errors
    ///
    /// Returns the raw failure, or a cancelled failure.
    pub async fn request_until_cancelled(
        &self,
        method: &str,
        params: Value,
        token: &CancellationToken,
    ) -> Result<Value, RpcFailure> {
        tokio::select! {
            biased;
            () = token.cancelled() => {
                tracing::debug!(method, "request abandoned by caller");
                Err(RpcFailure::cancelled())
            }
            outcome = self.request(method, params) => outcome,
        }
    }

    /// Whether requests go through a wallet.
    #[must_use]
    pub const fn is_injected(&self) -> bool {
        matches!(self, Self::Injected(_))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    #[derive(Debug)]
    struct Scripted {
        label: String,
        delay: Duration,
        outcome: Result<Value, RpcFailure>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(label: &str, delay_ms: u64, outcome: Result<Value, RpcFailure>) -> Arc<Self> {
            Arc::new(Self {
                label: label.to_owned(),
                delay: Duration::from_millis(delay_ms),
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl JsonRpcEndpoint for Scripted {
        fn label(&self) -> &str {
            &self.label
        }

        async fn call(&self, _method: &str, _params: Value) -> Result<Value, RpcFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.outcome.clone()
        }
    }

    fn channel(endpoints: &[Arc<Scripted>]) -> QuorumChannel {
        QuorumChannel::new(
            endpoints
                .iter()
                .map(|e| Arc::clone(e) as Arc<dyn JsonRpcEndpoint>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn first_success_wins_even_after_primary_fails() {
        let primary = Scripted::new("primary", 0, Err(RpcFailure::with_message("connection error")));
        let backup = Scripted::new("backup", 10, Ok(json!("0x138b")));
        let quorum = channel(&[primary, backup]);

        assert_eq!(quorum.request("eth_chainId", json!([])).await, Ok(json!("0x138b")));
    }

    #[tokio::test]
    async fn faster_endpoint_answers_first() {
        let slow = Scripted::new("slow", 500, Ok(json!("slow")));
        let fast = Scripted::new("fast", 0, Ok(json!("fast")));
        let quorum = channel(&[slow, fast]);

        assert_eq!(quorum.request("eth_blockNumber", json!([])).await, Ok(json!("fast")));
    }

    #[tokio::test]
    async fn all_failing_reports_primary_failure() {
        let primary = Scripted::new("primary", 20, Err(RpcFailure::with_code(-32002)));
        let backup = Scripted::new("backup", 0, Err(RpcFailure::new(-32603, "boom")));
        let quorum = channel(&[primary, backup]);

        let failure = quorum.request("eth_chainId", json!([])).await.unwrap_err();
        assert!(failure.has_code(-32002));
    }

    #[tokio::test]
    async fn channel_is_reusable() {
        let only = Scripted::new("only", 0, Ok(json!(1)));
        let quorum = channel(&[Arc::clone(&only)]);
        let channel = ConnectionChannel::Direct(quorum);

        for _ in 0..3 {
            assert!(channel.request("eth_chainId", json!([])).await.is_ok());
        }
        assert_eq!(only.calls.load(Ordering::SeqCst), 3);
        assert!(!channel.is_injected());
    }

    #[tokio::test]
    async fn cancelled_request_reports_cancellation() {
        let slow = Scripted::new("slow", 1_000, Ok(json!("late")));
        let channel = ConnectionChannel::Direct(channel(&[slow]));
        let token = CancellationToken::new();
        token.cancel();

        let failure = channel
            .request_until_cancelled("eth_chainId", json!([]), &token)
            .await
            .unwrap_err();
        assert!(failure.cancelled);
    }

    #[tokio::test]
    async fn dropped_request_does_not_poison_the_channel() {
        let slow = Scripted::new("slow", 1_000, Ok(json!("late")));
        let quorum = channel(&[slow]);

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), quorum.request("eth_chainId", json!([])))
                .await;
        assert!(abandoned.is_err());

        let fast = Scripted::new("fast", 0, Ok(json!("ok")));
        let quorum = QuorumChannel::new(vec![
            Arc::clone(&quorum.endpoints[0]),
            fast as Arc<dyn JsonRpcEndpoint>,
        ]);
        assert_eq!(quorum.request("eth_chainId", json!([])).await, Ok(json!("ok")));
    }
}
