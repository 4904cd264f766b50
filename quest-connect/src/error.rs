//! Unified error types for quest-connect.
//!
//! RPC outcomes are not represented here: they are classified into
//! [`ClassifiedError`](crate::classify::ClassifiedError) values. This type
//! covers everything around them (configuration, descriptor validation) and
//! lets the CLI surface a classified RPC failure through `?`.

use std::error::Error as StdError;

use thiserror::Error;

use crate::classify::ClassifiedError;

/// Top-level error type for quest-connect.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be resolved, read, written, or parsed.
    #[error("config: {0}")]
    Config(String),

    /// A network descriptor failed validation.
    #[error("network: {0}")]
    Network(String),

    /// A request on the wire failed; carries the display-ready classification.
    #[error("rpc: {0}")]
    Rpc(#[from] ClassifiedError),
}

impl Error {
    /// Creates an [`Error::Config`] from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an [`Error::Config`] from a context message and a source error.
    pub fn config_with(context: impl AsRef<str>, source: impl StdError) -> Self {
        Self::Config(format!("{}: {source}", context.as_ref()))
    }

    /// Creates an [`Error::Network`] from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}
