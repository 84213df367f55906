use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wallet_connector::{RechargeBackend, RechargeReceipt, SignedRecharge};

/// Client for the dashboard's HTTP backend.
#[derive(Clone, Debug)]
pub struct BackendClient {
    base_url: Url,
}

/// Off-chain balance as shown on the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub pending_amount: Decimal,
    pub currency: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(default, with = "rust_decimal::serde::float")]
    balance: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    balance_mon: Decimal,
}

impl BalanceResponse {
    fn into_summary(self, updated_at: String) -> BalanceSummary {
        BalanceSummary {
            balance: self.balance,
            pending_amount: self.balance_mon,
            currency: "MON".to_owned(),
            updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RechargeResponse {
    #[serde(alias = "tx_id", rename = "txId")]
    tx_id: Option<String>,
    #[serde(alias = "processed_at", rename = "processedAt")]
    processed_at: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    pub fn parse(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid backend url {}", base_url))?;

        Ok(Self::new(base_url))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base_url = self.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let url = base_url
            .join(path)
            .with_context(|| format!("failed to build url for {}", path))?;

        Ok(url)
    }

    pub async fn fetch_balance(&self, updated_at: String) -> Result<BalanceSummary> {
        let url = self.endpoint("api/v1/balance")?;

        let response = reqwest::get(url.clone())
            .await
            .with_context(|| format!("failed to GET {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("backend returned {} for balance: {}", status, body);
        }

        let balance = response
            .json::<BalanceResponse>()
            .await
            .context("failed to deserialize balance")?;

        Ok(balance.into_summary(updated_at))
    }
}

#[async_trait(?Send)]
impl RechargeBackend for BackendClient {
    async fn submit_recharge(&self, recharge: &SignedRecharge) -> Result<RechargeReceipt> {
        let url = self.endpoint("api/v1/mcp/recharge")?;
        let client = reqwest::Client::new();

        let response = client
            .post(url.clone())
            .json(recharge)
            .send()
            .await
            .with_context(|| format!("failed to POST {}", url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read recharge response")?;

        if !status.is_success() {
            bail!("backend rejected recharge with {}: {}", status, body);
        }

        let suffix = (js_sys::Math::random() * 1_000_000.0) as u32;

        Ok(receipt_from_response(
            &body,
            &recharge.account,
            crate::now(),
            suffix,
        ))
    }
}

/// Reads the receipt out of a recharge response, filling in whatever the backend left out.
fn receipt_from_response(
    body: &str,
    account: &str,
    processed_at: String,
    suffix: u32,
) -> RechargeReceipt {
    let response = serde_json::from_str::<RechargeResponse>(body).unwrap_or_else(|e| {
        log::debug!("recharge response carries no receipt: {}", e);
        RechargeResponse::default()
    });

    RechargeReceipt {
        tx_id: response
            .tx_id
            .unwrap_or_else(|| format!("{}-TX-{:06}", account, suffix % 1_000_000)),
        processed_at: response.processed_at.unwrap_or(processed_at),
    }
}
