//! Connects an injected browser wallet to the Monad testnet and keeps track of
//! what the dashboard should show about it.

pub mod balance;
pub mod chain;
pub mod connector;
pub mod provider;
pub mod recharge;
pub mod snapshot;

pub use balance::format_native_balance;
pub use chain::{ChainOverrides, NativeCurrency, TargetChain};
pub use connector::{Error, WalletConnector};
pub use provider::{BlockTag, Provider, ProviderError, ProviderEvent};
pub use recharge::{
    PaymentMethod, RechargeAmount, RechargeBackend, RechargeReceipt, SignedRecharge,
};
pub use snapshot::{ConnectionSnapshot, Status};
