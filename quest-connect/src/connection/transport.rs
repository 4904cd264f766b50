//! Raw RPC failures and the wallet-injected transport capability.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::broadcast;

use crate::network::AddChainParams;

/// Well-known JSON-RPC and EIP-1193 error codes.
pub mod codes {
    /// Resource unavailable / limit exceeded; endpoints use it when overloaded.
    pub const RATE_LIMITED: i64 = -32002;
    /// Symbolic code client libraries attach to exhausted fallback requests.
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
    /// User rejected the request (EIP-1193).
    pub const USER_REJECTED: i64 = 4001;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i64 = -32603;
    /// The wallet does not recognise the requested chain (EIP-3326).
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
}

/// Error code attached to a raw failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// Numeric JSON-RPC / EIP-1193 code.
    Numeric(i64),
    /// Symbolic code, e.g. `"UNKNOWN_ERROR"`.
    Symbolic(String),
}

impl ErrorCode {
    /// Whether this is the numeric code `code`.
    #[must_use]
    pub fn is(&self, code: i64) -> bool {
        matches!(self, Self::Numeric(c) if *c == code)
    }

    /// Whether this is the symbolic code `symbol`.
    #[must_use]
    pub fn is_symbol(&self, symbol: &str) -> bool {
        matches!(self, Self::Symbolic(s) if s == symbol)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(code) => write!(f, "{code}"),
            Self::Symbolic(symbol) => f.write_str(symbol),
        }
    }
}

/// Raw failure surfaced by a channel, before classification.
///
/// Every transport reduces its errors to this shape. It is an input to
/// [`classify`](crate::classify::classify) and is never meant for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcFailure {
    /// Error code, when the source provided one.
    #[serde(default)]
    pub code: Option<ErrorCode>,
    /// Error message, when the source provided one.
    #[serde(default)]
    pub message: Option<String>,
    /// The caller abandoned the request before it completed.
    #[serde(default)]
    pub cancelled: bool,
}

impl RpcFailure {
    /// Failure with a numeric code and message.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(ErrorCode::Numeric(code)),
            message: Some(message.into()),
            cancelled: false,
        }
    }

    /// Failure with only a numeric code.
    #[must_use]
    pub const fn with_code(code: i64) -> Self {
        Self {
            code: Some(ErrorCode::Numeric(code)),
            message: None,
            cancelled: false,
        }
    }

    /// Failure with only a message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: Some(message.into()),
            cancelled: false,
        }
    }

    /// Failure with a symbolic code and message.
    pub fn symbolic(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(ErrorCode::Symbolic(symbol.into())),
            message: Some(message.into()),
            cancelled: false,
        }
    }

    /// The caller abandoned the request.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self {
            code: None,
            message: None,
            cancelled: true,
        }
    }

    /// Whether the code is the numeric `code`.
    #[must_use]
    pub fn has_code(&self, code: i64) -> bool {
        self.code.as_ref().is_some_and(|c| c.is(code))
    }

    /// Message, or `""` when absent.
    #[must_use]
    pub fn message_str(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cancelled {
            return f.write_str("request cancelled");
        }
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "[{code}] {message}"),
            (Some(code), None) => write!(f, "[{code}]"),
            (None, Some(message)) => f.write_str(message),
            (None, None) => f.write_str("unspecified failure"),
        }
    }
}

impl std::error::Error for RpcFailure {}

/// Change notification emitted by a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// Connected accounts changed; empty means the wallet disconnected.
    AccountsChanged(Vec<String>),
    /// The wallet switched to another chain (hex chain id as reported).
    ChainChanged(String),
}

/// Wallet-injected transport (an EIP-1193 provider).
///
/// Implementations only need [`request`](Self::request) and
/// [`subscribe`](Self::subscribe); the chain verbs are provided on top of
/// `request` with the standard method names.
#[async_trait]
pub trait InjectedTransport: Send + Sync + fmt::Debug {
    /// Sends a JSON-RPC request through the wallet.
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcFailure>;

    /// Subscribes to account/chain change notifications.
    ///
    /// Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;

    /// Currently selected chain id (`eth_chainId`).
    async fn chain_id(&self) -> Result<String, RpcFailure> {
        let value = self.request("eth_chainId", json!([])).await?;
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| RpcFailure::with_message(format!("malformed eth_chainId result: {value}")))
    }

    /// Asks the wallet to switch chains (`wallet_switchEthereumChain`).
    async fn switch_chain(&self, chain_id: &str) -> Result<(), RpcFailure> {
        self.request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain_id }]),
        )
        .await
        .map(|_| ())
    }

    /// Asks the wallet to register a chain (`wallet_addEthereumChain`).
    async fn add_chain(&self, params: &AddChainParams) -> Result<(), RpcFailure> {
        let params = serde_json::to_value(params)
            .map_err(|e| RpcFailure::with_message(format!("add-chain params: {e}")))?;
        self.request("wallet_addEthereumChain", Value::Array(vec![params]))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_deserializes_numeric_and_symbolic() {
        let failure: RpcFailure =
            serde_json::from_value(json!({ "code": -32002, "message": "busy" })).unwrap();
        assert!(failure.has_code(codes::RATE_LIMITED));

        let failure: RpcFailure = serde_json::from_value(json!({ "code": "UNKNOWN_ERROR" })).unwrap();
        assert_eq!(
            failure.code,
            Some(ErrorCode::Symbolic(codes::UNKNOWN_ERROR.to_owned()))
        );
        assert!(failure.message.is_none());
    }

    #[test]
    fn display_never_empty() {
        assert_eq!(RpcFailure::default().to_string(), "unspecified failure");
        assert_eq!(RpcFailure::cancelled().to_string(), "request cancelled");
        assert_eq!(RpcFailure::new(4001, "denied").to_string(), "[4001] denied");
    }
}
