//! quest-connect CLI
//!
//! Inspects the network this build targets and exercises the fallback
//! channel and failure classification against live endpoints.
//!
//! ```sh
//! quest-connect init                      # Generate default config.toml
//! quest-connect network                   # Show the active network
//! quest-connect probe                     # Check the endpoints
//! quest-connect balance 0xabc...          # Native balance of an account
//! quest-connect classify --code -32002    # Classify a raw failure
//! ```

mod cmd;
mod signal;
#[cfg(feature = "telemetry")]
mod telemetry;

use clap::Parser;
use cmd::{Cli, Commands};
use dotenvy::dotenv;
use quest_connect::Error;
use quest_connect::config::{Config, load_config_or_default};

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    // Load .env variables
    dotenv().ok();

    rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider())
        .expect("Failed to initialize rustls crypto provider");

    let config = match &cli.command {
        Commands::Init { .. } => Ok(Config::default()),
        _ => load_config_or_default(&cli.config),
    };
    let config = config.unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    #[cfg(feature = "telemetry")]
    let _telemetry = telemetry::Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_log_level(config.log_level.clone())
        .register();
    #[cfg(not(feature = "telemetry"))]
    init_console_logging(config.log_level.as_deref());

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Init { output, force } => cmd::init::run(&output, force).map_err(Into::into),
        Commands::Network { json } => cmd::network::run(&config, json),
        Commands::Probe => cmd::probe::run(&config).await,
        Commands::Balance { address } => cmd::balance::run(&config, address).await,
        Commands::Classify {
            code,
            symbol,
            message,
            cancelled,
        } => cmd::classify::run(code, symbol, message, cancelled),
    };

    if let Err(e) = result {
        match e.downcast_ref::<Error>() {
            Some(Error::Rpc(outcome)) => {
                eprintln!("{}: {}", outcome.category.headline(), outcome.message);
                if let Some(delay) = outcome.suggested_delay_secs {
                    eprintln!("Retry in about {delay} seconds.");
                }
            }
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}

#[cfg(not(feature = "telemetry"))]
fn init_console_logging(level: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| level.unwrap_or("warn").into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
