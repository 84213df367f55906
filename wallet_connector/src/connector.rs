use crate::{
    balance::format_native_balance,
    chain::TargetChain,
    provider::{BlockTag, Provider, ProviderError, ProviderEvent},
    snapshot::{ConnectionSnapshot, Status},
};
use futures::{channel::mpsc, StreamExt};
use std::{cell::RefCell, rc::Rc};

const CONNECTION_CANCELLED: &str = "connection request cancelled";

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("wallet not installed")]
    ProviderAbsent,
    #[error("no usable account")]
    NoAccount,
    #[error("{0}")]
    UserRejected(ProviderError),
    #[error(transparent)]
    Provider(ProviderError),
}

impl From<ProviderError> for Error {
    fn from(error: ProviderError) -> Self {
        if error.is_user_rejected() {
            Error::UserRejected(error)
        } else {
            Error::Provider(error)
        }
    }
}

/// Keeps a wallet on the target chain and tracks what the UI should show.
///
/// All state is single-threaded. Clones share the same state, which is how the
/// event watch and the UI operate on one connection.
pub struct WalletConnector<P> {
    provider: Option<Rc<P>>,
    target: Rc<TargetChain>,
    state: Rc<RefCell<State>>,
}

struct State {
    snapshot: ConnectionSnapshot,
    /// The account hydration last succeeded for. Outlives snapshot replacements.
    account: Option<String>,
    observers: Vec<mpsc::UnboundedSender<ConnectionSnapshot>>,
}

impl<P> Clone for WalletConnector<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            target: self.target.clone(),
            state: self.state.clone(),
        }
    }
}

impl<P> WalletConnector<P> {
    /// `provider` is `None` if no wallet was detected.
    pub fn new(provider: Option<P>, target: TargetChain) -> Self {
        Self {
            provider: provider.map(Rc::new),
            target: Rc::new(target),
            state: Rc::new(RefCell::new(State {
                snapshot: ConnectionSnapshot::idle(),
                account: None,
                observers: Vec::new(),
            })),
        }
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.state.borrow().snapshot.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().snapshot.status == Status::Connected
    }

    pub fn target_chain(&self) -> &TargetChain {
        &self.target
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub(crate) fn provider(&self) -> Option<&P> {
        self.provider.as_deref()
    }

    /// Feed of published snapshots, starting with the current one.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ConnectionSnapshot> {
        let (sender, receiver) = mpsc::unbounded();
        let mut state = self.state.borrow_mut();

        let _ = sender.unbounded_send(state.snapshot.clone());
        state.observers.push(sender);

        receiver
    }

    fn publish(&self, snapshot: ConnectionSnapshot) {
        log::debug!("wallet snapshot: {:?}", snapshot);

        let mut state = self.state.borrow_mut();
        state
            .observers
            .retain(|observer| observer.unbounded_send(snapshot.clone()).is_ok());
        state.snapshot = snapshot;
    }

    fn bound_account(&self) -> Option<String> {
        self.state.borrow().account.clone()
    }
}

impl<P> WalletConnector<P>
where
    P: Provider,
{
    /// Ask the wallet for an account and bring it onto the target chain.
    ///
    /// Returns the snapshot that is current once the attempt settled.
    pub async fn connect(&self) -> ConnectionSnapshot {
        let provider = match self.provider.as_deref() {
            Some(provider) => provider,
            None => {
                log::warn!("cannot connect, no wallet detected");
                self.publish(ConnectionSnapshot::error(Error::ProviderAbsent.to_string()));

                return self.snapshot();
            }
        };

        self.publish(self.snapshot().connecting());

        match self.request_account(provider).await {
            Ok(()) => log::info!("wallet connected to {}", self.target.chain_name),
            Err(Error::UserRejected(_)) => {
                log::info!("user cancelled the connection request");
                self.publish(ConnectionSnapshot::idle_with_notice(CONNECTION_CANCELLED));
            }
            Err(e) => {
                log::warn!("failed to connect wallet: {}", e);
                self.publish(ConnectionSnapshot::error(e.to_string()));
            }
        }

        self.snapshot()
    }

    /// Re-hydrate the bound account. Does nothing without one.
    pub async fn refresh(&self) {
        let (provider, account) = match (self.provider.as_deref(), self.bound_account()) {
            (Some(provider), Some(account)) => (provider, account),
            _ => {
                log::debug!("nothing to refresh, no account bound");
                return;
            }
        };

        if let Err(e) = self.hydrate(provider, &account).await {
            log::warn!("failed to refresh wallet: {}", e);
            self.publish(self.snapshot().with_error_message(e.to_string()));
        }
    }

    pub async fn handle_event(&self, event: ProviderEvent) {
        let provider = match self.provider.as_deref() {
            Some(provider) => provider,
            None => return,
        };

        let account = match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                Some(account) => account,
                None => {
                    log::info!("wallet revoked all accounts");
                    self.state.borrow_mut().account = None;
                    self.publish(ConnectionSnapshot::idle());

                    return;
                }
            },
            ProviderEvent::ChainChanged(chain_id) => match self.bound_account() {
                Some(account) => {
                    log::debug!("wallet switched to chain {}", chain_id);
                    account
                }
                None => {
                    log::trace!("ignoring switch to chain {}, no account bound", chain_id);
                    return;
                }
            },
        };

        if let Err(e) = self.hydrate(provider, &account).await {
            log::warn!("failed to follow wallet change: {}", e);
            self.publish(ConnectionSnapshot::error(e.to_string()));
        }
    }

    /// Follow the wallet's account and chain changes until the event stream ends.
    ///
    /// Dropping the returned future unsubscribes from the wallet.
    pub async fn watch(&self) {
        let mut events = match self.provider.as_deref() {
            Some(provider) => provider.events(),
            None => return,
        };

        while let Some(event) = events.next().await {
            self.handle_event(event).await;
        }

        log::debug!("wallet event stream ended");
    }

    async fn request_account(&self, provider: &P) -> Result<(), Error> {
        let accounts = provider.request_accounts().await?;
        let account = accounts.into_iter().next().ok_or(Error::NoAccount)?;

        self.hydrate(provider, &account).await
    }

    async fn hydrate(&self, provider: &P, account: &str) -> Result<(), Error> {
        self.ensure_target_chain(provider).await?;
        self.state.borrow_mut().account = Some(account.to_owned());

        let balance = provider.get_balance(account, BlockTag::Latest).await?;

        self.publish(ConnectionSnapshot {
            status: Status::Connected,
            account: Some(account.to_owned()),
            chain_id: Some(self.target.chain_id.clone()),
            network_name: Some(self.target.chain_name.clone()),
            native_balance: Some(format_native_balance(&balance)),
            error_message: None,
        });

        Ok(())
    }

    async fn ensure_target_chain(&self, provider: &P) -> Result<(), Error> {
        match provider.chain_id().await {
            Ok(current) if self.target.is_same_chain(&current) => return Ok(()),
            Ok(current) => log::debug!(
                "wallet is on chain {}, switching to {}",
                current,
                self.target.chain_id
            ),
            Err(e) => log::debug!("failed to read the wallet's chain, switching anyway: {}", e),
        }

        match provider.switch_chain(&self.target.chain_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_unrecognized_chain() => {
                log::info!("wallet does not know {}, adding it", self.target.chain_name);
                provider.add_chain(&self.target).await?;

                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
