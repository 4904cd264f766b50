//! `quest-connect network`: show the active network descriptor.

use quest_connect::config::Config;
use quest_connect::network::{NetworkRegistry, candidate_endpoints};

/// Prints the active network, including configured fallbacks.
///
/// # Errors
///
/// Returns an error if a configured fallback endpoint is invalid or JSON
/// serialisation fails.
#[allow(clippy::print_stdout)]
pub fn run(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = NetworkRegistry::builtin(&config.extra_rpc_endpoints)?;
    let network = registry.active_network();

    if json {
        println!("{}", serde_json::to_string_pretty(network)?);
        return Ok(());
    }

    let currency = network.native_currency();
    println!("network:   {}", network.display_name());
    println!("chain id:  {} ({})", network.chain_id(), network.chain_id().value());
    println!(
        "currency:  {} ({}, {} decimals)",
        currency.name, currency.symbol, currency.decimals
    );
    println!("explorer:  {}", network.explorer_url());
    for (index, url) in candidate_endpoints(network).iter().enumerate() {
        let role = if index == 0 { "primary" } else { "fallback" };
        println!("rpc:       {url} [{role}]");
    }
    Ok(())
}
