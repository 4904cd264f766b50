//! RPC resilience layer for quest dApps.
//!
//! Decides which EVM network to target, keeps a wallet pointed at it, builds
//! request channels with fallback endpoints, and turns low-level RPC failures
//! into display-ready outcomes.
//!
//! - [`network`]: [`NetworkDescriptor`](network::NetworkDescriptor) and the
//!   active-network [`NetworkRegistry`](network::NetworkRegistry).
//! - [`connection`]: [`ConnectionManager`](connection::ConnectionManager),
//!   [`ConnectionChannel`](connection::ConnectionChannel) and
//!   [`WalletSession`](connection::WalletSession).
//! - [`classify`](mod@classify): the ordered failure classification table.
//! - [`balance`]: native balance lookup.
//! - [`config`]: TOML configuration.
//!
//! ```no_run
//! use quest_connect::connection::ConnectionManager;
//! use quest_connect::network::NetworkRegistry;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), quest_connect::Error> {
//! let registry = NetworkRegistry::builtin(&[])?;
//! let manager = ConnectionManager::new(&registry)?;
//! let channel = manager.open_channel(None);
//! match channel.request("eth_blockNumber", json!([])).await {
//!     Ok(block) => println!("latest block {block}"),
//!     Err(failure) => {
//!         let outcome = manager.classify(&failure);
//!         eprintln!("{}: {}", outcome.category.headline(), outcome.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod balance;
pub mod classify;
pub mod config;
pub mod connection;
pub mod error;
pub mod network;

pub use self::classify::{ClassifiedError, ErrorCategory};
pub use self::error::Error;
