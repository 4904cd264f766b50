//! Network targeting and channel construction.

use std::sync::Arc;
use std::time::Duration;

use crate::classify::{ClassifiedError, ErrorCategory, classify};
use crate::error::Error;
use crate::network::{NetworkDescriptor, NetworkRegistry, candidate_endpoints};

use super::channel::{ConnectionChannel, QuorumChannel};
use super::endpoint::{DEFAULT_RPC_TIMEOUT, HttpEndpoint, JsonRpcEndpoint, http_client};
use super::transport::{InjectedTransport, RpcFailure, codes};

/// Builds channels to the active network and keeps wallets pointed at it.
///
/// The manager never retries on its own: failures are classified and
/// returned, and the caller decides what to do with them.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    network: Arc<NetworkDescriptor>,
    client: reqwest::Client,
}

impl ConnectionManager {
    /// Creates a manager for the registry's active network with the default
    /// per-endpoint timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn new(registry: &NetworkRegistry) -> Result<Self, Error> {
        Self::with_timeout(registry, DEFAULT_RPC_TIMEOUT)
    }

    /// Creates a manager whose direct endpoints time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn with_timeout(registry: &NetworkRegistry, timeout: Duration) -> Result<Self, Error> {
        let client =
            http_client(timeout).map_err(|e| Error::config_with("failed to build HTTP client", e))?;
        Ok(Self {
            network: registry.active_arc(),
            client,
        })
    }

    /// The network this manager targets.
    #[must_use]
    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    /// Makes sure `wallet` is on the active network, switching or registering
    /// it as needed.
    ///
    /// Without a wallet this succeeds immediately; the caller then uses direct
    /// endpoints. When the wallet does not know the chain, it is registered
    /// with only the primary endpoint.
    ///
    /// # Errors
    ///
    /// - [`ErrorCategory::NetworkAddMissing`] if registering the chain fails.
    /// - [`ErrorCategory::Unknown`] (retryable) if the switch fails for any
    ///   other reason.
    /// - The classification of the failure if the chain id cannot be read.
    pub async fn ensure_active_network(
        &self,
        wallet: Option<&dyn InjectedTransport>,
    ) -> Result<(), ClassifiedError> {
        let Some(wallet) = wallet else {
            return Ok(());
        };
        let target = self.network.chain_id();

        let current = wallet.chain_id().await.map_err(|failure| {
            tracing::warn!(%failure, "failed to read wallet chain id");
            classify(&failure)
        })?;
        if target.matches(&current) {
            tracing::debug!(chain_id = %target, "wallet already on active network");
            return Ok(());
        }

        tracing::info!(from = %current, to = %target, "switching wallet network");
        match wallet.switch_chain(target.as_str()).await {
            Ok(()) => Ok(()),
            Err(failure) if failure.has_code(codes::UNRECOGNIZED_CHAIN) => {
                self.add_active_network(wallet).await
            }
            Err(failure) => {
                tracing::warn!(%failure, network = %self.network, "network switch failed");
                Err(ClassifiedError::new(
                    ErrorCategory::Unknown,
                    failure.message_str(),
                    true,
                    None,
                ))
            }
        }
    }

    async fn add_active_network(
        &self,
        wallet: &dyn InjectedTransport,
    ) -> Result<(), ClassifiedError> {
        let params = self.network.add_chain_params();
        tracing::info!(
            network = %self.network,
            rpc_url = %self.network.primary_endpoint(),
            "wallet does not know the network, adding it"
        );
        wallet.add_chain(&params).await.map_err(|failure| {
            tracing::warn!(%failure, network = %self.network, "adding network failed");
            ClassifiedError::new(
                ErrorCategory::NetworkAddMissing,
                add_failure_message(&self.network, &failure),
                true,
                None,
            )
        })
    }

    /// Opens a request channel.
    ///
    /// With a wallet, all requests pass through it. Without one, a direct
    /// connection is made to every candidate endpoint of the active network
    /// and combined under a quorum-of-1 policy.
    #[must_use]
    pub fn open_channel(&self, wallet: Option<Arc<dyn InjectedTransport>>) -> ConnectionChannel {
        if let Some(wallet) = wallet {
            tracing::debug!("opening channel through injected wallet");
            return ConnectionChannel::Injected(wallet);
        }
        let endpoints: Vec<Arc<dyn JsonRpcEndpoint>> = candidate_endpoints(&self.network)
            .iter()
            .map(|url| {
                Arc::new(HttpEndpoint::new(url.clone(), self.client.clone()))
                    as Arc<dyn JsonRpcEndpoint>
            })
            .collect();
        tracing::debug!(
            network = %self.network,
            endpoints = endpoints.len(),
            "opening direct quorum channel"
        );
        ConnectionChannel::Direct(QuorumChannel::new(endpoints))
    }

    /// Classifies a failure surfaced by one of this manager's channels.
    #[must_use]
    pub fn classify(&self, error: &RpcFailure) -> ClassifiedError {
        classify(error)
    }
}

fn add_failure_message(network: &NetworkDescriptor, failure: &RpcFailure) -> String {
    let detail = failure.message_str().trim();
    if detail.is_empty() {
        format!(
            "Failed to add {}. Please add it manually in your wallet settings.",
            network.display_name()
        )
    } else {
        format!("Failed to add {}: {detail}", network.display_name())
    }
}
