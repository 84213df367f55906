use crate::{
    connector::WalletConnector,
    provider::{Provider, ProviderError},
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, str::FromStr};

/// Largest amount a single recharge may carry before it needs manual review.
pub const MAX_RECHARGE_AMOUNT: u32 = 500_000;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("recharge amount must be greater than 0")]
    NonPositiveAmount,
    #[error("amount exceeds the per-transaction risk limit of {}, contact an administrator", MAX_RECHARGE_AMOUNT)]
    AmountAboveLimit,
    #[error("wallet not installed")]
    ProviderAbsent,
    #[error("connect a wallet on the target network first")]
    NotConnected,
    #[error("signature request cancelled")]
    SignatureRejected,
    #[error(transparent)]
    Provider(ProviderError),
    #[error(transparent)]
    Submission(anyhow::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    UsdtTrc20,
    UsdcErc20,
    BankTransfer,
    Mon,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::UsdtTrc20 => "usdt-trc20",
            PaymentMethod::UsdcErc20 => "usdc-erc20",
            PaymentMethod::BankTransfer => "bank-transfer",
            PaymentMethod::Mon => "mon",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "usdt-trc20" => Ok(PaymentMethod::UsdtTrc20),
            "usdc-erc20" => Ok(PaymentMethod::UsdcErc20),
            "bank-transfer" => Ok(PaymentMethod::BankTransfer),
            "mon" => Ok(PaymentMethod::Mon),
            other => Err(UnknownPaymentMethod(other.to_owned())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unsupported payment method: {0}")]
pub struct UnknownPaymentMethod(String);

/// A recharge amount within the accepted range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RechargeAmount(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl RechargeAmount {
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for RechargeAmount {
    type Error = Error;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::NonPositiveAmount);
        }
        if amount > Decimal::from(MAX_RECHARGE_AMOUNT) {
            return Err(Error::AmountAboveLimit);
        }

        Ok(Self(amount))
    }
}

impl fmt::Display for RechargeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// The text the wallet is asked to sign to authorize a recharge.
pub fn authorization_message(
    account: &str,
    amount: RechargeAmount,
    method: PaymentMethod,
    timestamp: &str,
) -> String {
    [
        "Authorize Recharge".to_owned(),
        format!("Account: {}", account),
        format!("Amount: {}", amount),
        format!("Method: {}", method),
        format!("Timestamp: {}", timestamp),
    ]
    .join("\n")
}

/// A recharge the wallet signed, ready to be handed to the backend.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SignedRecharge {
    pub account: String,
    pub amount: RechargeAmount,
    pub method: PaymentMethod,
    pub signature: String,
    #[serde(skip)]
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeReceipt {
    pub tx_id: String,
    pub processed_at: String,
}

#[async_trait(?Send)]
pub trait RechargeBackend {
    async fn submit_recharge(&self, recharge: &SignedRecharge) -> anyhow::Result<RechargeReceipt>;
}

impl<P> WalletConnector<P>
where
    P: Provider,
{
    /// Have the connected wallet sign a recharge of `amount` paid with `method`.
    pub async fn authorize_recharge(
        &self,
        amount: Decimal,
        method: PaymentMethod,
        timestamp: &str,
    ) -> Result<SignedRecharge, Error> {
        let amount = RechargeAmount::try_from(amount)?;
        let account = self.snapshot().account.ok_or(Error::NotConnected)?;
        let provider = self.provider().ok_or(Error::ProviderAbsent)?;

        let message = authorization_message(&account, amount, method, timestamp);
        let signature = provider
            .sign(&message, &account)
            .await
            .map_err(|e| {
                if e.is_user_rejected() {
                    Error::SignatureRejected
                } else {
                    Error::Provider(e)
                }
            })?;

        log::debug!("recharge of {} via {} signed by {}", amount, method, account);

        Ok(SignedRecharge {
            account,
            amount,
            method,
            signature,
            message,
        })
    }

    /// Sign a recharge and submit it to `backend`.
    pub async fn recharge<B>(
        &self,
        backend: &B,
        amount: Decimal,
        method: PaymentMethod,
        timestamp: &str,
    ) -> Result<RechargeReceipt, Error>
    where
        B: RechargeBackend + ?Sized,
    {
        let recharge = self.authorize_recharge(amount, method, timestamp).await?;
        let receipt = backend
            .submit_recharge(&recharge)
            .await
            .map_err(Error::Submission)?;

        log::info!("recharge submitted, tracking id {}", receipt.tx_id);

        Ok(receipt)
    }
}
