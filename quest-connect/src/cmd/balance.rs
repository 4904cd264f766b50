//! `quest-connect balance`: show an account's native balance.

use alloy_primitives::Address;

use quest_connect::Error;
use quest_connect::balance::native_balance;
use quest_connect::classify::classify;
use quest_connect::config::Config;
use quest_connect::connection::{ConnectionManager, RpcFailure};
use quest_connect::network::NetworkRegistry;

use crate::signal::Interrupt;

/// Fetches and prints the latest native balance of `address`.
///
/// # Errors
///
/// Returns an error if the channel cannot be built or the request fails or
/// is interrupted (as a classified [`Error::Rpc`]).
#[allow(clippy::print_stdout)]
pub async fn run(config: &Config, address: Address) -> Result<(), Box<dyn std::error::Error>> {
    let registry = NetworkRegistry::builtin(&config.extra_rpc_endpoints)?;
    let manager = ConnectionManager::with_timeout(&registry, config.rpc_timeout())?;
    let channel = manager.open_channel(None);
    let currency = manager.network().native_currency();

    let interrupt = Interrupt::listen()?;
    let outcome = tokio::select! {
        biased;
        () = interrupt.token().cancelled() => Err(classify(&RpcFailure::cancelled())),
        balance = native_balance(&channel, currency, address) => balance,
    };
    interrupt.release().await;
    let balance = outcome.map_err(Error::from)?;

    println!("{address}: {balance}");
    Ok(())
}
