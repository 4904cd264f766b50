//! Network descriptors and the active-network registry.
//!
//! - [`NetworkDescriptor`], [`ChainIdHex`] and the EIP-3085
//!   [`AddChainParams`].
//! - Built-in testnets, build-time selection via [`builtin_network`] and
//!   the [`NetworkRegistry`].

mod descriptor;
mod registry;

pub use self::descriptor::*;
pub use self::registry::*;
