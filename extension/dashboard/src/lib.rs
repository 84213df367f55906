use anyhow::{Context, Result};
use conquer_once::Lazy;
use futures::{
    channel::mpsc,
    future::{AbortHandle, Abortable},
    FutureExt, StreamExt, TryFutureExt,
};
use js_sys::Promise;
use rust_decimal::Decimal;
use std::cell::RefCell;
use wallet_connector::{
    ConnectionSnapshot, NativeCurrency, PaymentMethod, RechargeReceipt, TargetChain,
    WalletConnector,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{window, CustomEvent, CustomEventInit};

#[macro_use]
mod macros;

mod backend;
mod ethereum;
mod logger;

use crate::{
    backend::{BackendClient, BalanceSummary},
    ethereum::Ethereum,
};

mod constants {
    include!(concat!(env!("OUT_DIR"), "/constants.rs"));
}

/// Name of the event dispatched on `window` whenever the connection snapshot changes.
pub const SNAPSHOT_EVENT: &str = "walletSnapshot";

static TARGET_CHAIN: Lazy<TargetChain> = Lazy::new(|| TargetChain {
    chain_id: constants::CHAIN_ID.to_owned(),
    chain_name: constants::CHAIN_NAME.to_owned(),
    native_currency: NativeCurrency {
        name: constants::CURRENCY_NAME.to_owned(),
        symbol: constants::CURRENCY_SYMBOL.to_owned(),
        decimals: constants::CURRENCY_DECIMALS,
    },
    rpc_urls: vec![constants::RPC_URL.to_owned()],
    block_explorer_urls: vec![constants::EXPLORER_URL.to_owned()],
});

thread_local! {
    static DASHBOARD: RefCell<Option<Dashboard>> = RefCell::new(None);
}

/// Everything that lives between `initialize()` and `teardown()`.
struct Dashboard {
    connector: WalletConnector<Ethereum>,
    backend: BackendClient,
    tasks: Vec<AbortHandle>,
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[wasm_bindgen]
pub fn initialize() -> Result<(), JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // without local storage logging simply stays off
    let _ = logger::try_init();

    map_err_from_anyhow!(try_initialize())
}

/// Stops following wallet events and forwarding snapshots.
#[wasm_bindgen]
pub fn teardown() {
    let dashboard = DASHBOARD.with(|dashboard| dashboard.borrow_mut().take());

    if dashboard.is_some() {
        log::info!("dashboard torn down");
    }
}

fn try_initialize() -> Result<()> {
    teardown();

    let window = window().context("failed to access window object")?;

    let provider = Ethereum::detect();
    if provider.is_none() {
        log::warn!("no wallet extension detected");
    }

    let connector = WalletConnector::new(provider, TARGET_CHAIN.clone());
    let backend = BackendClient::parse(constants::BACKEND_API_URL)?;

    let forwarder = spawn_abortable(forward_snapshots(connector.subscribe()));
    let watcher = {
        let connector = connector.clone();
        spawn_abortable(async move { connector.watch().await })
    };

    DASHBOARD.with(|dashboard| {
        *dashboard.borrow_mut() = Some(Dashboard {
            connector,
            backend,
            tasks: vec![forwarder, watcher],
        })
    });

    impl_window!(
        window,
        async fn connectWallet() -> Result<ConnectionSnapshot> {
            let snapshot = current_connector()?.connect().await;

            Ok(snapshot)
        }
    )?;
    impl_window!(
        window,
        async fn refreshWallet() -> Result<ConnectionSnapshot> {
            let connector = current_connector()?;
            connector.refresh().await;

            Ok(connector.snapshot())
        }
    )?;
    impl_window!(
        window,
        async fn getWalletSnapshot() -> Result<ConnectionSnapshot> {
            Ok(current_connector()?.snapshot())
        }
    )?;
    impl_window!(
        window,
        async fn isWalletConnected() -> Result<bool> {
            Ok(current_connector()?.is_connected())
        }
    )?;
    impl_window!(
        window,
        async fn getTargetNetwork() -> Result<TargetChain> {
            Ok(TARGET_CHAIN.clone())
        }
    )?;
    impl_window!(
        window,
        async fn getBackendBalance() -> Result<BalanceSummary> {
            let balance = current_backend()?.fetch_balance(now()).await?;

            Ok(balance)
        }
    )?;
    impl_window!(
        window,
        async fn submitRecharge(amount: Decimal, method: PaymentMethod) -> Result<RechargeReceipt> {
            let receipt = current_connector()?
                .recharge(&current_backend()?, amount, method, &now())
                .await?;

            Ok(receipt)
        }
    )?;

    log::info!(
        "dashboard initialized for {} ({})",
        TARGET_CHAIN.chain_name,
        TARGET_CHAIN.chain_id
    );

    Ok(())
}

fn with_dashboard<T>(f: impl FnOnce(&Dashboard) -> T) -> Result<T> {
    DASHBOARD.with(|dashboard| {
        dashboard
            .borrow()
            .as_ref()
            .map(f)
            .context("dashboard is not initialized")
    })
}

fn current_connector() -> Result<WalletConnector<Ethereum>> {
    with_dashboard(|dashboard| dashboard.connector.clone())
}

fn current_backend() -> Result<BackendClient> {
    with_dashboard(|dashboard| dashboard.backend.clone())
}

fn spawn_abortable<F>(future: F) -> AbortHandle
where
    F: std::future::Future<Output = ()> + 'static,
{
    let (handle, registration) = AbortHandle::new_pair();
    spawn_local(Abortable::new(future, registration).map(|_| ()));

    handle
}

async fn forward_snapshots(mut feed: mpsc::UnboundedReceiver<ConnectionSnapshot>) {
    while let Some(snapshot) = feed.next().await {
        log::debug!("wallet status is now {:?}", snapshot.status);

        if let Err(e) = dispatch_snapshot(&snapshot) {
            log::warn!("failed to publish wallet snapshot: {:#}", e);
        }
    }
}

fn dispatch_snapshot(snapshot: &ConnectionSnapshot) -> Result<()> {
    let window = window().context("failed to access window object")?;
    let detail = JsValue::from_serde(snapshot).context("failed to serialize snapshot")?;

    let mut init = CustomEventInit::new();
    init.detail(&detail);

    let event = map_err_to_anyhow!(CustomEvent::new_with_event_init_dict(
        SNAPSHOT_EVENT,
        &init
    ))?;
    map_err_to_anyhow!(window.dispatch_event(&event))?;

    Ok(())
}

/// The current time as an ISO-8601 string.
pub(crate) fn now() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}
