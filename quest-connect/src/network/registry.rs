//! Built-in networks and the active-network registry.

use std::sync::Arc;

use url::Url;

use super::descriptor::{NativeCurrency, NetworkDescriptor};
use crate::error::Error;

/// Mantle Sepolia testnet (chain id 5003).
#[must_use]
pub fn mantle_sepolia() -> NetworkDescriptor {
    NetworkDescriptor::new(
        "0x138b",
        "Mantle Testnet",
        NativeCurrency::new("Mantle", "MNT", 18),
        ["https://rpc.sepolia.mantle.xyz"],
        "https://explorer.sepolia.mantle.xyz",
    )
    .expect("built-in Mantle Sepolia descriptor is valid")
}

/// Story Aeneid testnet (chain id 1315).
#[must_use]
pub fn story_aeneid() -> NetworkDescriptor {
    NetworkDescriptor::new(
        "0x523",
        "Story Aeneid Testnet",
        NativeCurrency::new("IP", "IP", 18),
        ["https://aeneid.storyrpc.io"],
        "https://aeneid.storyscan.io",
    )
    .expect("built-in Story Aeneid descriptor is valid")
}

/// Returns the network this build targets.
///
/// Selected at compile time: the `network-story-aeneid` feature picks Story
/// Aeneid, otherwise Mantle Sepolia.
#[must_use]
pub fn builtin_network() -> NetworkDescriptor {
    #[cfg(feature = "network-story-aeneid")]
    {
        story_aeneid()
    }
    #[cfg(not(feature = "network-story-aeneid"))]
    {
        mantle_sepolia()
    }
}

/// Returns the descriptor's endpoints unchanged.
///
/// Order is significant: index 0 is used whenever exactly one endpoint is
/// required, e.g. when registering the network with a wallet.
#[must_use]
pub fn candidate_endpoints(descriptor: &NetworkDescriptor) -> &[Url] {
    descriptor.rpc_endpoints()
}

/// Holds the single active network descriptor for the process.
///
/// Fixed at construction; there are no mutation operations. Cloning shares
/// the descriptor.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    active: Arc<NetworkDescriptor>,
}

impl NetworkRegistry {
    /// Creates a registry around an explicit descriptor.
    #[must_use]
    pub fn new(active: NetworkDescriptor) -> Self {
        Self {
            active: Arc::new(active),
        }
    }

    /// Creates a registry for [`builtin_network`], with `extra_endpoints`
    /// appended as lower-priority fallbacks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if an extra endpoint is not HTTP(S).
    pub fn builtin(extra_endpoints: &[Url]) -> Result<Self, Error> {
        let descriptor = builtin_network().with_fallbacks(extra_endpoints)?;
        tracing::debug!(
            network = %descriptor,
            endpoints = descriptor.rpc_endpoints().len(),
            "active network selected"
        );
        Ok(Self::new(descriptor))
    }

    /// The single configured target network.
    #[must_use]
    pub fn active_network(&self) -> &NetworkDescriptor {
        &self.active
    }

    /// Shared handle to the active descriptor.
    #[must_use]
    pub fn active_arc(&self) -> Arc<NetworkDescriptor> {
        Arc::clone(&self.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_descriptors_are_valid() {
        let mantle = mantle_sepolia();
        assert_eq!(mantle.chain_id().as_str(), "0x138b");
        assert_eq!(mantle.chain_id().value(), 5003);

        let story = story_aeneid();
        assert_eq!(story.chain_id().as_str(), "0x523");
        assert_eq!(story.chain_id().value(), 1315);
    }

    #[cfg(not(feature = "network-story-aeneid"))]
    #[test]
    fn default_build_targets_mantle_sepolia() {
        let registry = NetworkRegistry::builtin(&[]).unwrap();
        assert_eq!(registry.active_network().chain_id().as_str(), "0x138b");
    }

    #[cfg(feature = "network-story-aeneid")]
    #[test]
    fn story_feature_targets_story_aeneid() {
        let registry = NetworkRegistry::builtin(&[]).unwrap();
        assert_eq!(registry.active_network().chain_id().as_str(), "0x523");
    }

    #[test]
    fn candidate_endpoints_keep_primary_first() {
        let extra = [Url::parse("https://fallback.example.org").unwrap()];
        let registry = NetworkRegistry::builtin(&extra).unwrap();
        let active = registry.active_network();
        let endpoints = candidate_endpoints(active);

        assert_eq!(endpoints.len(), 2);
        assert_eq!(&endpoints[0], builtin_network().primary_endpoint());
        assert_eq!(endpoints[1], extra[0]);
    }

    #[test]
    fn builtin_rejects_non_http_fallback() {
        let extra = [Url::parse("ftp://fallback.example.org").unwrap()];
        assert!(NetworkRegistry::builtin(&extra).is_err());
    }
}
