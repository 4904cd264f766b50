//! CLI definitions and command implementations.

use std::path::PathBuf;

use alloy_primitives::Address;
use clap::{Parser, Subcommand};

pub mod balance;
pub mod classify;
pub mod init;
pub mod network;
pub mod probe;

/// quest-connect: network targeting and RPC diagnostics for quest dApps.
#[derive(Debug, Parser)]
#[command(name = "quest-connect")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file. Missing files mean defaults.
    #[arg(short, long, global = true, env = "CONFIG", default_value = "config.toml")]
    pub config: PathBuf,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a default TOML configuration file.
    Init {
        /// Output path for the configuration file.
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite the file if it already exists.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Show the network this build targets.
    Network {
        /// Print as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Query every configured endpoint through the fallback channel.
    Probe,

    /// Show the native balance of an address.
    Balance {
        /// Account address (0x-prefixed).
        address: Address,
    },

    /// Classify a raw RPC failure and print the outcome as JSON.
    Classify {
        /// Numeric error code (e.g. -32002, 4001).
        #[arg(long, allow_negative_numbers = true, conflicts_with = "symbol")]
        code: Option<i64>,

        /// Symbolic error code (e.g. `UNKNOWN_ERROR`).
        #[arg(long)]
        symbol: Option<String>,

        /// Error message.
        #[arg(long)]
        message: Option<String>,

        /// Treat the failure as a request abandoned by the caller.
        #[arg(long, default_value_t = false)]
        cancelled: bool,
    },
}
