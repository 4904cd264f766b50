//! Wallet-side transaction submission and receipt polling.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::channel::ConnectionChannel;
use super::transport::RpcFailure;

/// Interval between `eth_getTransactionReceipt` polls.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Mined transaction, as reported by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Transaction hash.
    pub transaction_hash: String,
    /// Block the transaction was included in.
    #[serde(default)]
    pub block_number: Option<String>,
    /// `0x1` on success, `0x0` when execution reverted.
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    /// Whether execution reverted.
    #[must_use]
    pub fn reverted(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("0x0"))
    }
}

/// Sends `tx` with `eth_sendTransaction` and waits for it to be mined.
///
/// The receipt is polled every [`RECEIPT_POLL_INTERVAL`] until it appears;
/// callers bound the wait by dropping the future.
///
/// # Errors
///
/// Returns the failure of the submission or of any poll, a message failure
/// for a malformed response, or a message failure when execution reverted.
pub async fn submit_transaction(
    channel: &ConnectionChannel,
    tx: Value,
) -> Result<TransactionReceipt, RpcFailure> {
    let hash = channel.request("eth_sendTransaction", json!([tx])).await?;
    let hash = hash
        .as_str()
        .ok_or_else(|| RpcFailure::with_message(format!("malformed transaction hash: {hash}")))?
        .to_owned();
    tracing::info!(%hash, "transaction submitted");

    let receipt = wait_for_receipt(channel, &hash).await?;
    if receipt.reverted() {
        tracing::warn!(%hash, "transaction reverted");
        return Err(RpcFailure::with_message(format!(
            "transaction {hash} reverted"
        )));
    }
    tracing::info!(%hash, block = ?receipt.block_number, "transaction mined");
    Ok(receipt)
}

async fn wait_for_receipt(
    channel: &ConnectionChannel,
    hash: &str,
) -> Result<TransactionReceipt, RpcFailure> {
    loop {
        let value = channel
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if value.is_null() {
            tracing::trace!(%hash, "receipt not available yet");
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
            continue;
        }
        return serde_json::from_value(value)
            .map_err(|e| RpcFailure::with_message(format!("malformed receipt: {e}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_status_zero_is_reverted() {
        let receipt: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": "0xabc",
            "blockNumber": "0x10",
            "status": "0x0"
        }))
        .unwrap();
        assert!(receipt.reverted());
    }

    #[test]
    fn receipt_without_status_is_not_reverted() {
        let receipt: TransactionReceipt =
            serde_json::from_value(json!({ "transactionHash": "0xabc" })).unwrap();
        assert!(!receipt.reverted());
        assert_eq!(receipt.block_number, None);
    }
}
