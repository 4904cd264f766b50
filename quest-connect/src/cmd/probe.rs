//! `quest-connect probe`: check the active network through the fallback
//! channel.

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use quest_connect::Error;
use quest_connect::balance::parse_quantity;
use quest_connect::config::Config;
use quest_connect::connection::{ConnectionChannel, ConnectionManager, RpcFailure};
use quest_connect::network::NetworkRegistry;

use crate::signal::Interrupt;

/// Queries `eth_chainId` and `eth_blockNumber` through a direct quorum
/// channel and verifies the endpoints serve the expected chain.
///
/// # Errors
///
/// Returns an error if the channel cannot be built, a request fails (as a
/// classified [`Error::Rpc`]), the request is interrupted, or the endpoints
/// serve another chain.
#[allow(clippy::print_stdout)]
pub async fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let registry = NetworkRegistry::builtin(&config.extra_rpc_endpoints)?;
    let manager = ConnectionManager::with_timeout(&registry, config.rpc_timeout())?;
    let channel = manager.open_channel(None);

    let interrupt = Interrupt::listen()?;
    let outcome = probe(&manager, &channel, interrupt.token()).await;
    interrupt.release().await;
    let block = outcome?;

    println!("{}: reachable, latest block {block}", manager.network());
    Ok(())
}

async fn probe(
    manager: &ConnectionManager,
    channel: &ConnectionChannel,
    token: &CancellationToken,
) -> Result<u64, Error> {
    let expected = manager.network().chain_id();

    let reported = call(manager, channel, "eth_chainId", token).await?;
    let reported = reported.as_str().unwrap_or_default();
    if !expected.matches(reported) {
        return Err(Error::network(format!(
            "endpoints serve chain '{reported}', expected {expected}"
        )));
    }

    let block = call(manager, channel, "eth_blockNumber", token).await?;
    parse_quantity(&block)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| {
            manager
                .classify(&RpcFailure::with_message(format!(
                    "malformed eth_blockNumber result: {block}"
                )))
                .into()
        })
}

async fn call(
    manager: &ConnectionManager,
    channel: &ConnectionChannel,
    method: &str,
    token: &CancellationToken,
) -> Result<Value, Error> {
    channel
        .request_until_cancelled(method, json!([]), token)
        .await
        .map_err(|failure| manager.classify(&failure).into())
}
