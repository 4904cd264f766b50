//! Native balance lookup and formatting.

use std::fmt;

use alloy_primitives::utils::format_units;
use alloy_primitives::{Address, U256};
use serde::Serialize;
use serde_json::{Value, json};

use crate::classify::{ClassifiedError, classify};
use crate::connection::{ConnectionChannel, RpcFailure};
use crate::network::NativeCurrency;

/// Native currency balance of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    /// Amount in the smallest unit.
    pub raw: U256,
    /// Amount in whole units, decimal formatted.
    pub formatted: String,
    /// Currency symbol.
    pub symbol: String,
}

impl Balance {
    /// Formats `raw` with the currency's decimals.
    ///
    /// # Errors
    ///
    /// Returns a classified error if the currency has more decimals than a
    /// `U256` can express.
    pub fn new(raw: U256, currency: &NativeCurrency) -> Result<Self, ClassifiedError> {
        let formatted = format_units(raw, currency.decimals).map_err(|e| {
            classify(&RpcFailure::with_message(format!(
                "cannot format amount with {} decimals: {e}",
                currency.decimals
            )))
        })?;
        Ok(Self {
            raw,
            formatted,
            symbol: currency.symbol.clone(),
        })
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.formatted, self.symbol)
    }
}

/// Fetches the latest native balance of `address` through `channel`.
///
/// # Errors
///
/// Returns the classified failure of the request, or of decoding its result.
pub async fn native_balance(
    channel: &ConnectionChannel,
    currency: &NativeCurrency,
    address: Address,
) -> Result<Balance, ClassifiedError> {
    let value = channel
        .request("eth_getBalance", json!([address, "latest"]))
        .await
        .map_err(|failure| classify(&failure))?;
    let raw = parse_quantity(&value).ok_or_else(|| {
        classify(&RpcFailure::with_message(format!(
            "malformed eth_getBalance result: {value}"
        )))
    })?;
    Balance::new(raw, currency)
}

/// Parses a JSON-RPC hex quantity (`"0x..."`).
#[must_use]
pub fn parse_quantity(value: &Value) -> Option<U256> {
    let digits = value.as_str()?.strip_prefix("0x")?;
    U256::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_currency_decimals() {
        let mnt = NativeCurrency::new("Mantle", "MNT", 18);
        let balance = Balance::new(U256::from(1_500_000_000_000_000_000_u128), &mnt).unwrap();
        assert_eq!(balance.formatted, "1.500000000000000000");
        assert_eq!(balance.to_string(), "1.500000000000000000 MNT");
    }

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_quantity(&json!("0x0")), Some(U256::ZERO));
        assert_eq!(parse_quantity(&json!("0xde0b6b3a7640000")), Some(U256::from(10_u64.pow(18))));
        assert_eq!(parse_quantity(&json!("12")), None);
        assert_eq!(parse_quantity(&json!(12)), None);
    }
}
