use anyhow::{Context, Result};
use std::{env, fs, iter, path::Path};
use wallet_connector::{ChainOverrides, TargetChain};

const BACKEND_API_URL_VAR: &str = "BACKEND_API_URL";
const DEFAULT_BACKEND_API_URL: &str = "https://blitzx402.vercel.app";

fn main() -> Result<()> {
    let out_dir = env::var_os("OUT_DIR").context("unable to access OUT_DIR")?;
    let constants_rs = Path::new(&out_dir).join("constants.rs");

    for var in ChainOverrides::VARS.iter().chain(iter::once(&BACKEND_API_URL_VAR)) {
        println!("cargo:rerun-if-env-changed={}", var);
    }

    let chain = TargetChain::from_overrides(ChainOverrides::from_env());
    let rpc_url = chain.rpc_urls.first().context("target chain has no RPC url")?;
    let explorer_url = chain
        .block_explorer_urls
        .first()
        .context("target chain has no explorer url")?;

    let backend_api_url = env::var(BACKEND_API_URL_VAR)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_API_URL.to_owned());

    fs::write(
        &constants_rs,
        &format!(
            r#"
pub const CHAIN_ID: &str = {:?};
pub const CHAIN_NAME: &str = {:?};
pub const CURRENCY_NAME: &str = {:?};
pub const CURRENCY_SYMBOL: &str = {:?};
pub const CURRENCY_DECIMALS: u8 = {};
pub const RPC_URL: &str = {:?};
pub const EXPLORER_URL: &str = {:?};
pub const BACKEND_API_URL: &str = {:?};
"#,
            chain.chain_id,
            chain.chain_name,
            chain.native_currency.name,
            chain.native_currency.symbol,
            chain.native_currency.decimals,
            rpc_url,
            explorer_url,
            backend_api_url,
        ),
    )
    .context("failed to write constants.rs file")?;

    Ok(())
}
