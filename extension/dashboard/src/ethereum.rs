//! Rust bindings for the EIP-1193 provider that wallet extensions inject as `window.ethereum`.

use async_trait::async_trait;
use futures::{
    channel::mpsc,
    stream::{self, LocalBoxStream, Stream},
    task::{Context, Poll},
    StreamExt,
};
use js_sys::{Function, Promise, Reflect};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::pin::Pin;
use wallet_connector::{BlockTag, Provider, ProviderError, ProviderEvent, TargetChain};
use wasm_bindgen::{prelude::*, JsCast};
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[derive(Debug, Clone)]
    pub type Ethereum;

    #[wasm_bindgen(method, catch)]
    fn request(this: &Ethereum, args: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method)]
    fn on(this: &Ethereum, event: &str, listener: &Function);

    #[wasm_bindgen(method, js_name = removeListener)]
    fn remove_listener(this: &Ethereum, event: &str, listener: &Function);
}

#[derive(Serialize)]
struct RequestArguments<'a> {
    method: &'a str,
    params: serde_json::Value,
}

impl Ethereum {
    /// The injected provider, if a wallet extension is installed.
    pub fn detect() -> Option<Ethereum> {
        let window = web_sys::window()?;
        let ethereum = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;

        if ethereum.is_undefined() || ethereum.is_null() {
            return None;
        }

        Some(ethereum.unchecked_into())
    }

    /// Not every wallet implements the event emitter part of EIP-1193.
    fn emits_events(&self) -> bool {
        ["on", "removeListener"].iter().all(|name| {
            Reflect::get(self, &JsValue::from_str(name))
                .map(|member| member.is_function())
                .unwrap_or(false)
        })
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> Result<JsValue, ProviderError> {
        let args = JsValue::from_serde(&RequestArguments { method, params }).map_err(|e| {
            ProviderError::without_code(format!("failed to serialize {} request: {}", method, e))
        })?;

        log::debug!("calling wallet method {}", method);

        let promise = self.request(&args).map_err(provider_error)?;
        let value = JsFuture::from(promise).await.map_err(provider_error)?;

        Ok(value)
    }

    async fn call_for<T>(&self, method: &str, params: serde_json::Value) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        let value = self.call(method, params).await?;

        value.into_serde::<T>().map_err(|e| {
            ProviderError::without_code(format!("unexpected response to {}: {}", method, e))
        })
    }
}

#[async_trait(?Send)]
impl Provider for Ethereum {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.call_for("eth_requestAccounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<String, ProviderError> {
        self.call_for("eth_chainId", json!([])).await
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<(), ProviderError> {
        self.call("wallet_switchEthereumChain", json!([{ "chainId": chain_id }]))
            .await?;

        Ok(())
    }

    async fn add_chain(&self, chain: &TargetChain) -> Result<(), ProviderError> {
        self.call("wallet_addEthereumChain", json!([chain])).await?;

        Ok(())
    }

    async fn get_balance(&self, address: &str, block: BlockTag) -> Result<String, ProviderError> {
        self.call_for("eth_getBalance", json!([address, block.as_str()]))
            .await
    }

    async fn sign(&self, message: &str, address: &str) -> Result<String, ProviderError> {
        self.call_for("personal_sign", json!([message, address]))
            .await
    }

    fn events(&self) -> LocalBoxStream<'static, ProviderEvent> {
        if !self.emits_events() {
            log::debug!("wallet does not emit events, not following account changes");
            return stream::empty().boxed_local();
        }

        let (sender, receiver) = mpsc::unbounded();

        let accounts_changed = {
            let sender = sender.clone();
            Closure::wrap(Box::new(move |accounts: JsValue| {
                let accounts = accounts.into_serde::<Vec<String>>().unwrap_or_default();
                let _ = sender.unbounded_send(ProviderEvent::AccountsChanged(accounts));
            }) as Box<dyn FnMut(JsValue)>)
        };
        let chain_changed = Closure::wrap(Box::new(move |chain_id: JsValue| {
            let chain_id = chain_id.as_string().unwrap_or_default();
            let _ = sender.unbounded_send(ProviderEvent::ChainChanged(chain_id));
        }) as Box<dyn FnMut(JsValue)>);

        Subscription {
            receiver,
            _listeners: vec![
                Listener::new(self.clone(), "accountsChanged", accounts_changed),
                Listener::new(self.clone(), "chainChanged", chain_changed),
            ],
        }
        .boxed_local()
    }
}

/// Reads `code` and `message` off whatever the wallet rejected with.
fn provider_error(error: JsValue) -> ProviderError {
    let code = Reflect::get(&error, &JsValue::from_str("code"))
        .ok()
        .and_then(|code| code.as_f64())
        .map(|code| code as i64);
    let message = Reflect::get(&error, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .or_else(|| error.as_string())
        .unwrap_or_else(|| "wallet request failed".to_owned());

    ProviderError { code, message }
}

struct Subscription {
    receiver: mpsc::UnboundedReceiver<ProviderEvent>,
    _listeners: Vec<Listener>,
}

impl Stream for Subscription {
    type Item = ProviderEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

/// A wallet event listener that is removed again on drop.
struct Listener {
    ethereum: Ethereum,
    event: &'static str,
    cb: Closure<dyn FnMut(JsValue)>,
}

impl Listener {
    fn new(ethereum: Ethereum, event: &'static str, cb: Closure<dyn FnMut(JsValue)>) -> Self {
        ethereum.on(event, cb.as_ref().unchecked_ref());

        Self { ethereum, event, cb }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        log::trace!("removing wallet listener for {}", self.event);
        self.ethereum
            .remove_listener(self.event, self.cb.as_ref().unchecked_ref());
    }
}
