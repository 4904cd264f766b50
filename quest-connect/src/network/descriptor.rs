//! Network descriptor types and validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use url::Url;

use crate::error::Error;

/// Hex digits that fit in a `u64` chain identifier.
const MAX_CHAIN_ID_DIGITS: usize = 16;

/// EIP-155 chain identifier in canonical `0x`-prefixed lowercase hex form.
///
/// Construction guarantees the string matches `^0x[0-9a-f]+$` and fits in a
/// `u64`, so [`ChainIdHex::value`] is infallible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainIdHex {
    hex: String,
    value: u64,
}

impl ChainIdHex {
    /// Returns the canonical hex string (e.g. `"0x138b"`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// Returns the numeric chain id.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.value
    }

    /// Whether a chain id reported by a wallet refers to this chain.
    ///
    /// Wallets are not consistent about hex casing, so the comparison is on
    /// the numeric value. Input without a `0x`/`0X` prefix, or with anything
    /// but hex digits after it, never matches.
    #[must_use]
    pub fn matches(&self, reported: &str) -> bool {
        let Some(digits) = reported
            .strip_prefix("0x")
            .or_else(|| reported.strip_prefix("0X"))
        else {
            return false;
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return false;
        }
        u64::from_str_radix(digits, 16).is_ok_and(|v| v == self.value)
    }
}

impl FromStr for ChainIdHex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| Error::network(format!("chain id '{s}' must start with 0x")))?;
        if digits.is_empty()
            || !digits
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(Error::network(format!(
                "chain id '{s}' must be lowercase hex"
            )));
        }
        if digits.trim_start_matches('0').len() > MAX_CHAIN_ID_DIGITS {
            return Err(Error::network(format!("chain id '{s}' does not fit in u64")));
        }
        let value = u64::from_str_radix(digits, 16)
            .map_err(|e| Error::network(format!("chain id '{s}': {e}")))?;
        Ok(Self {
            hex: s.to_owned(),
            value,
        })
    }
}

impl fmt::Display for ChainIdHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

impl Serialize for ChainIdHex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.hex)
    }
}

/// Native currency of a network, as wallets expect it in EIP-3085.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// Human-readable name (e.g. `"Mantle"`).
    pub name: String,
    /// Ticker symbol (e.g. `"MNT"`).
    pub symbol: String,
    /// Decimal places of the smallest unit.
    pub decimals: u8,
}

impl NativeCurrency {
    /// Creates a native currency description.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Immutable description of a candidate EVM network.
///
/// Fields are private; a descriptor can only be obtained through
/// [`NetworkDescriptor::new`], which enforces a valid chain id and a
/// non-empty list of HTTP(S) RPC endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkDescriptor {
    chain_id: ChainIdHex,
    display_name: String,
    native_currency: NativeCurrency,
    rpc_endpoints: Vec<Url>,
    explorer_url: Url,
}

impl NetworkDescriptor {
    /// Builds and validates a descriptor.
    ///
    /// The first endpoint is the primary; the rest are fallbacks in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the chain id is malformed, the endpoint
    /// list is empty, or any URL fails to parse or is not HTTP(S).
    pub fn new<I, S>(
        chain_id: &str,
        display_name: impl Into<String>,
        native_currency: NativeCurrency,
        rpc_endpoints: I,
        explorer_url: &str,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chain_id: ChainIdHex = chain_id.parse()?;
        let rpc_endpoints = rpc_endpoints
            .into_iter()
            .map(|raw| parse_endpoint(raw.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if rpc_endpoints.is_empty() {
            return Err(Error::network(format!(
                "no RPC endpoints configured for chain {chain_id}"
            )));
        }
        let explorer_url = Url::parse(explorer_url)
            .map_err(|e| Error::network(format!("invalid explorer URL '{explorer_url}': {e}")))?;
        Ok(Self {
            chain_id,
            display_name: display_name.into(),
            native_currency,
            rpc_endpoints,
            explorer_url,
        })
    }

    /// Returns a copy of this descriptor with `extra` endpoints appended after
    /// the existing ones. Endpoints already present are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if an extra endpoint is not HTTP(S).
    pub fn with_fallbacks(&self, extra: &[Url]) -> Result<Self, Error> {
        let mut descriptor = self.clone();
        for url in extra {
            check_scheme(url)?;
            if !descriptor.rpc_endpoints.contains(url) {
                descriptor.rpc_endpoints.push(url.clone());
            }
        }
        Ok(descriptor)
    }

    /// Chain identifier.
    #[must_use]
    pub const fn chain_id(&self) -> &ChainIdHex {
        &self.chain_id
    }

    /// Display name shown to users and wallets.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Native currency.
    #[must_use]
    pub const fn native_currency(&self) -> &NativeCurrency {
        &self.native_currency
    }

    /// Ordered RPC endpoints; never empty.
    #[must_use]
    pub fn rpc_endpoints(&self) -> &[Url] {
        &self.rpc_endpoints
    }

    /// Primary RPC endpoint.
    #[must_use]
    pub fn primary_endpoint(&self) -> &Url {
        &self.rpc_endpoints[0]
    }

    /// Block explorer base URL.
    #[must_use]
    pub const fn explorer_url(&self) -> &Url {
        &self.explorer_url
    }

    /// Parameters for `wallet_addEthereumChain`.
    ///
    /// Only the primary endpoint is offered; wallets do their own endpoint
    /// selection once the network is registered.
    #[must_use]
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: self.chain_id.as_str().to_owned(),
            chain_name: self.display_name.clone(),
            native_currency: self.native_currency.clone(),
            rpc_urls: vec![self.primary_endpoint().to_string()],
            block_explorer_urls: vec![self.explorer_url.to_string()],
        }
    }
}

impl fmt::Display for NetworkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.chain_id)
    }
}

/// EIP-3085 `wallet_addEthereumChain` parameter object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    /// `0x`-prefixed chain id.
    pub chain_id: String,
    /// Network display name.
    pub chain_name: String,
    /// Native currency.
    pub native_currency: NativeCurrency,
    /// RPC URLs offered to the wallet.
    pub rpc_urls: Vec<String>,
    /// Block explorer URLs.
    pub block_explorer_urls: Vec<String>,
}

fn parse_endpoint(raw: &str) -> Result<Url, Error> {
    let url =
        Url::parse(raw).map_err(|e| Error::network(format!("invalid RPC URL '{raw}': {e}")))?;
    check_scheme(&url)?;
    Ok(url)
}

fn check_scheme(url: &Url) -> Result<(), Error> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::network(format!(
            "RPC URL '{url}' has unsupported scheme '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currency() -> NativeCurrency {
        NativeCurrency::new("Mantle", "MNT", 18)
    }

    #[test]
    fn chain_id_accepts_lowercase_hex() {
        let id: ChainIdHex = "0x138b".parse().unwrap();
        assert_eq!(id.value(), 5003);
        assert_eq!(id.as_str(), "0x138b");
    }

    #[test]
    fn chain_id_rejects_malformed_input() {
        for bad in ["138b", "0x", "0x138B", "0xzz", "0x1_0", "0x1ffffffffffffffff"] {
            assert!(bad.parse::<ChainIdHex>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn chain_id_matches_ignores_case() {
        let id: ChainIdHex = "0x523".parse().unwrap();
        assert!(id.matches("0x523"));
        assert!(id.matches("0X523"));
        assert!(!id.matches("0x138b"));
        assert!(!id.matches("not-hex"));
    }

    #[test]
    fn chain_id_matches_requires_prefixed_hex_digits() {
        let id: ChainIdHex = "0x523".parse().unwrap();
        assert!(!id.matches("523"));
        assert!(!id.matches("0x+523"));
        assert!(!id.matches("0x"));
        assert!(!id.matches("0x 523"));
    }

    #[test]
    fn descriptor_requires_endpoints() {
        let err = NetworkDescriptor::new(
            "0x138b",
            "Mantle Testnet",
            currency(),
            Vec::<&str>::new(),
            "https://explorer.sepolia.mantle.xyz",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn descriptor_rejects_non_http_endpoint() {
        let err = NetworkDescriptor::new(
            "0x138b",
            "Mantle Testnet",
            currency(),
            ["wss://rpc.sepolia.mantle.xyz"],
            "https://explorer.sepolia.mantle.xyz",
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn fallbacks_are_appended_after_primary() {
        let descriptor = NetworkDescriptor::new(
            "0x138b",
            "Mantle Testnet",
            currency(),
            ["https://rpc.sepolia.mantle.xyz"],
            "https://explorer.sepolia.mantle.xyz",
        )
        .unwrap();
        let extra = vec![
            Url::parse("https://backup.example.org").unwrap(),
            Url::parse("https://rpc.sepolia.mantle.xyz").unwrap(),
        ];
        let extended = descriptor.with_fallbacks(&extra).unwrap();

        assert_eq!(extended.rpc_endpoints().len(), 2);
        assert_eq!(extended.primary_endpoint(), descriptor.primary_endpoint());
        assert_eq!(extended.rpc_endpoints()[1].as_str(), "https://backup.example.org/");
    }

    #[test]
    fn add_chain_params_offer_only_primary_endpoint() {
        let descriptor = NetworkDescriptor::new(
            "0x138b",
            "Mantle Testnet",
            currency(),
            ["https://rpc.sepolia.mantle.xyz", "https://backup.example.org"],
            "https://explorer.sepolia.mantle.xyz",
        )
        .unwrap();
        let params = serde_json::to_value(descriptor.add_chain_params()).unwrap();

        assert_eq!(params["chainId"], "0x138b");
        assert_eq!(params["chainName"], "Mantle Testnet");
        assert_eq!(params["nativeCurrency"]["decimals"], 18);
        assert_eq!(
            params["rpcUrls"],
            serde_json::json!(["https://rpc.sepolia.mantle.xyz/"])
        );
    }
}
