//! `quest-connect classify`: classify a raw failure from the command line.

use quest_connect::classify::classify;
use quest_connect::connection::{ErrorCode, RpcFailure};

/// Builds a raw failure from the arguments and prints its classification.
///
/// # Errors
///
/// Returns an error if JSON serialisation fails.
#[allow(clippy::print_stdout)]
pub fn run(
    code: Option<i64>,
    symbol: Option<String>,
    message: Option<String>,
    cancelled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let failure = RpcFailure {
        code: code.map(ErrorCode::Numeric).or(symbol.map(ErrorCode::Symbolic)),
        message,
        cancelled,
    };
    println!("{}", serde_json::to_string_pretty(&classify(&failure))?);
    Ok(())
}
