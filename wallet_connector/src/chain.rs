use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_CHAIN_ID: &str = "0x4EAF";
pub const DEFAULT_CHAIN_NAME: &str = "Monad Testnet";
pub const DEFAULT_CURRENCY_NAME: &str = "Monad";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "MON";
pub const DEFAULT_RPC_URL: &str = "https://testnet-rpc.monad.xyz";
pub const DEFAULT_EXPLORER_URL: &str = "https://testnet.monadscan.io";

/// Decimals of the native currency. The balance formatting assumes 18.
pub const NATIVE_DECIMALS: u8 = 18;

/// The network the wallet has to be operating on.
///
/// Serializes into the parameter object of `wallet_addEthereumChain` (EIP-3085).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetChain {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TargetChain {
    pub fn from_overrides(overrides: ChainOverrides) -> Self {
        Self {
            chain_id: normalize_chain_id(overrides.chain_id.as_deref()),
            chain_name: overrides
                .chain_name
                .unwrap_or_else(|| DEFAULT_CHAIN_NAME.to_owned()),
            native_currency: NativeCurrency {
                name: overrides
                    .currency_name
                    .unwrap_or_else(|| DEFAULT_CURRENCY_NAME.to_owned()),
                symbol: overrides
                    .currency_symbol
                    .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_owned()),
                decimals: NATIVE_DECIMALS,
            },
            rpc_urls: vec![overrides
                .rpc_url
                .unwrap_or_else(|| DEFAULT_RPC_URL.to_owned())],
            block_explorer_urls: vec![overrides
                .explorer_url
                .unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_owned())],
        }
    }

    /// Whether a chain id reported by a wallet refers to this chain.
    ///
    /// Wallets report lowercase hex while the configured id may be uppercase,
    /// hence the numeric comparison.
    pub fn is_same_chain(&self, reported: &str) -> bool {
        match (parse_chain_id(&self.chain_id), parse_chain_id(reported)) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => self.chain_id.eq_ignore_ascii_case(reported.trim()),
        }
    }
}

impl Default for TargetChain {
    fn default() -> Self {
        Self::from_overrides(ChainOverrides::default())
    }
}

/// Optional replacements for the built-in Monad testnet parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChainOverrides {
    pub chain_id: Option<String>,
    pub chain_name: Option<String>,
    pub currency_name: Option<String>,
    pub currency_symbol: Option<String>,
    pub rpc_url: Option<String>,
    pub explorer_url: Option<String>,
}

impl ChainOverrides {
    pub const CHAIN_ID_VAR: &'static str = "MONAD_CHAIN_ID";
    pub const CHAIN_NAME_VAR: &'static str = "MONAD_CHAIN_NAME";
    pub const CURRENCY_NAME_VAR: &'static str = "MONAD_CURRENCY_NAME";
    pub const CURRENCY_SYMBOL_VAR: &'static str = "MONAD_CURRENCY_SYMBOL";
    pub const RPC_URL_VAR: &'static str = "MONAD_RPC_URL";
    pub const EXPLORER_URL_VAR: &'static str = "MONAD_EXPLORER_URL";

    pub const VARS: [&'static str; 6] = [
        Self::CHAIN_ID_VAR,
        Self::CHAIN_NAME_VAR,
        Self::CURRENCY_NAME_VAR,
        Self::CURRENCY_SYMBOL_VAR,
        Self::RPC_URL_VAR,
        Self::EXPLORER_URL_VAR,
    ];

    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the overrides from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            chain_id: get(Self::CHAIN_ID_VAR),
            chain_name: get(Self::CHAIN_NAME_VAR),
            currency_name: get(Self::CURRENCY_NAME_VAR),
            currency_symbol: get(Self::CURRENCY_SYMBOL_VAR),
            rpc_url: get(Self::RPC_URL_VAR),
            explorer_url: get(Self::EXPLORER_URL_VAR),
        }
    }
}

/// Turn a configured chain id into the `0x`-prefixed form wallets expect.
///
/// `0x` values are taken as they are, decimal and `0X` values are converted to
/// lowercase hex and anything else falls back to [`DEFAULT_CHAIN_ID`].
pub fn normalize_chain_id(value: Option<&str>) -> String {
    let value = match value.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return DEFAULT_CHAIN_ID.to_owned(),
    };

    if value.starts_with("0x") {
        return value.to_owned();
    }

    match parse_chain_id(value) {
        Some(numeric) => format!("0x{:x}", numeric),
        None => {
            log::warn!(
                "chain id '{}' is neither hex nor decimal, using {}",
                value,
                DEFAULT_CHAIN_ID
            );
            DEFAULT_CHAIN_ID.to_owned()
        }
    }
}

fn parse_chain_id(value: &str) -> Option<u64> {
    let value = value.trim();

    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}
