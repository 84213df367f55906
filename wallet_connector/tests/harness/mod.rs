//! A scripted in-memory wallet.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{
    channel::mpsc,
    stream::{LocalBoxStream, Stream},
    task::{Context, Poll},
    StreamExt,
};
use std::{cell::RefCell, collections::HashMap, pin::Pin, rc::Rc};
use wallet_connector::{
    BlockTag, ConnectionSnapshot, Provider, ProviderError, ProviderEvent, TargetChain,
};

pub const ONE_MON: &str = "0xDE0B6B3A7640000";

#[derive(Clone)]
pub struct FakeWallet {
    inner: Rc<RefCell<Inner>>,
}

struct Inner {
    accounts: Result<Vec<String>, ProviderError>,
    chain_id: String,
    known_chains: Vec<String>,
    switch_error: Option<ProviderError>,
    balances: HashMap<String, Result<String, ProviderError>>,
    sign_error: Option<ProviderError>,
    requests: Vec<String>,
    added_chains: Vec<TargetChain>,
    signed: Vec<(String, String)>,
    event_sender: Option<mpsc::UnboundedSender<ProviderEvent>>,
    listening: bool,
}

impl FakeWallet {
    /// A wallet on Ethereum mainnet that already knows the Monad testnet.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                accounts: Ok(vec!["0xABCD".to_owned()]),
                chain_id: "0x1".to_owned(),
                known_chains: vec!["0x1".to_owned(), "0x4eaf".to_owned()],
                switch_error: None,
                balances: HashMap::new(),
                sign_error: None,
                requests: Vec::new(),
                added_chains: Vec::new(),
                signed: Vec::new(),
                event_sender: None,
                listening: false,
            })),
        }
    }

    pub fn with_accounts(self, accounts: &[&str]) -> Self {
        self.inner.borrow_mut().accounts = Ok(accounts.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn rejecting_accounts(self, error: ProviderError) -> Self {
        self.inner.borrow_mut().accounts = Err(error);
        self
    }

    pub fn on_chain(self, chain_id: &str) -> Self {
        self.inner.borrow_mut().chain_id = chain_id.to_owned();
        self
    }

    pub fn without_known_chains(self) -> Self {
        self.inner.borrow_mut().known_chains.clear();
        self
    }

    pub fn failing_switch(self, error: ProviderError) -> Self {
        self.inner.borrow_mut().switch_error = Some(error);
        self
    }

    pub fn rejecting_signatures(self, error: ProviderError) -> Self {
        self.inner.borrow_mut().sign_error = Some(error);
        self
    }

    pub fn set_balance(&self, account: &str, raw: &str) {
        self.inner
            .borrow_mut()
            .balances
            .insert(account.to_owned(), Ok(raw.to_owned()));
    }

    pub fn fail_balance(&self, account: &str, error: ProviderError) {
        self.inner
            .borrow_mut()
            .balances
            .insert(account.to_owned(), Err(error));
    }

    pub fn current_chain(&self) -> String {
        self.inner.borrow().chain_id.clone()
    }

    pub fn requests(&self) -> Vec<String> {
        self.inner.borrow().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.inner.borrow_mut().requests.clear();
    }

    pub fn added_chains(&self) -> Vec<TargetChain> {
        self.inner.borrow().added_chains.clone()
    }

    pub fn signed(&self) -> Vec<(String, String)> {
        self.inner.borrow().signed.clone()
    }

    pub fn is_listening(&self) -> bool {
        self.inner.borrow().listening
    }

    pub fn emit(&self, event: ProviderEvent) {
        let inner = self.inner.borrow();
        let sender = inner
            .event_sender
            .as_ref()
            .expect("nobody subscribed to wallet events");

        sender.unbounded_send(event).unwrap();
    }

    fn record(&self, method: &str) {
        self.inner.borrow_mut().requests.push(method.to_owned());
    }
}

#[async_trait(?Send)]
impl Provider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.record("eth_requestAccounts");
        self.inner.borrow().accounts.clone()
    }

    async fn chain_id(&self) -> Result<String, ProviderError> {
        self.record("eth_chainId");
        Ok(self.inner.borrow().chain_id.clone())
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<(), ProviderError> {
        self.record("wallet_switchEthereumChain");
        let mut inner = self.inner.borrow_mut();

        if let Some(error) = inner.switch_error.clone() {
            return Err(error);
        }
        if !inner
            .known_chains
            .iter()
            .any(|known| known.eq_ignore_ascii_case(chain_id))
        {
            return Err(ProviderError::new(
                4902,
                format!("Unrecognized chain ID \"{}\"", chain_id),
            ));
        }

        inner.chain_id = chain_id.to_lowercase();
        Ok(())
    }

    async fn add_chain(&self, chain: &TargetChain) -> Result<(), ProviderError> {
        self.record("wallet_addEthereumChain");
        let mut inner = self.inner.borrow_mut();

        inner.known_chains.push(chain.chain_id.clone());
        inner.chain_id = chain.chain_id.to_lowercase();
        inner.added_chains.push(chain.clone());
        Ok(())
    }

    async fn get_balance(&self, address: &str, block: BlockTag) -> Result<String, ProviderError> {
        assert_eq!(block, BlockTag::Latest);
        self.record("eth_getBalance");

        self.inner
            .borrow()
            .balances
            .get(address)
            .cloned()
            .unwrap_or_else(|| Ok("0x0".to_owned()))
    }

    async fn sign(&self, message: &str, address: &str) -> Result<String, ProviderError> {
        self.record("personal_sign");
        let mut inner = self.inner.borrow_mut();

        if let Some(error) = inner.sign_error.clone() {
            return Err(error);
        }

        inner.signed.push((message.to_owned(), address.to_owned()));
        Ok(format!("0xsigned-by-{}", address))
    }

    fn events(&self) -> LocalBoxStream<'static, ProviderEvent> {
        let (sender, receiver) = mpsc::unbounded();
        {
            let mut inner = self.inner.borrow_mut();
            inner.event_sender = Some(sender);
            inner.listening = true;
        }

        Subscription {
            receiver,
            wallet: self.clone(),
        }
        .boxed_local()
    }
}

struct Subscription {
    receiver: mpsc::UnboundedReceiver<ProviderEvent>,
    wallet: FakeWallet,
}

impl Stream for Subscription {
    type Item = ProviderEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut inner = self.wallet.inner.borrow_mut();
        inner.listening = false;
        inner.event_sender = None;
    }
}

/// Everything published so far that has not been looked at yet.
pub fn drain(feed: &mut mpsc::UnboundedReceiver<ConnectionSnapshot>) -> Vec<ConnectionSnapshot> {
    let mut snapshots = Vec::new();
    while let Ok(Some(snapshot)) = feed.try_next() {
        snapshots.push(snapshot);
    }
    snapshots
}
