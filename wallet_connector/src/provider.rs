//! The capabilities we need from an injected wallet (EIP-1193).

use crate::chain::TargetChain;
use async_trait::async_trait;
use futures::stream::LocalBoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The user rejected the request.
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// `wallet_switchEthereumChain` was asked for a chain the wallet does not know.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

#[async_trait(?Send)]
pub trait Provider {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    async fn chain_id(&self) -> Result<String, ProviderError>;

    async fn switch_chain(&self, chain_id: &str) -> Result<(), ProviderError>;

    async fn add_chain(&self, chain: &TargetChain) -> Result<(), ProviderError>;

    /// Balance in the smallest unit, as returned by `eth_getBalance`.
    async fn get_balance(&self, address: &str, block: BlockTag) -> Result<String, ProviderError>;

    async fn sign(&self, message: &str, address: &str) -> Result<String, ProviderError>;

    /// Wallet-emitted events. Dropping the stream unsubscribes from the wallet.
    fn events(&self) -> LocalBoxStream<'static, ProviderEvent>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    Latest,
    Pending,
    Earliest,
}

impl BlockTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockTag::Latest => "latest",
            BlockTag::Pending => "pending",
            BlockTag::Earliest => "earliest",
        }
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error returned by the wallet for a request.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn without_code(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == Some(USER_REJECTED_REQUEST)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Some(UNRECOGNIZED_CHAIN)
    }
}
