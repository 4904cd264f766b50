//! Connection & resilience layer.
//!
//! - [`RpcFailure`], error [`codes`] and the [`InjectedTransport`] wallet
//!   capability.
//! - [`HttpEndpoint`]: direct JSON-RPC endpoints over HTTP.
//! - [`ConnectionChannel`] and [`QuorumChannel`] quorum-of-1 aggregation.
//! - [`ConnectionManager`]: network targeting and channel construction.
//! - [`WalletSession`]: channel lifecycle tied to wallet change
//!   notifications.
//! - [`submit_transaction`]: wallet-side submission and receipt polling.

mod channel;
mod endpoint;
mod manager;
mod session;
mod transaction;
mod transport;

pub use self::channel::*;
pub use self::endpoint::*;
pub use self::manager::*;
pub use self::session::*;
pub use self::transaction::*;
pub use self::transport::*;
