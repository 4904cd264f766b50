//! Wallet session: a channel bound to the wallet's change notifications.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::classify::{ClassifiedError, ErrorCategory, classify};

use super::channel::ConnectionChannel;
use super::manager::ConnectionManager;
use super::transaction::{TransactionReceipt, submit_transaction};
use super::transport::{InjectedTransport, RpcFailure, WalletEvent};

const NO_WALLET_MESSAGE: &str = "Connect a wallet to send transactions.";

/// Live connection to the active network.
///
/// Owns the current [`ConnectionChannel`] and, when a wallet is present, its
/// change subscription. The channel is recreated in place whenever the
/// wallet reports an account or chain change, and a wallet that wanders off
/// the active network is asked to switch back. Dropping the session releases
/// the subscription.
#[derive(Debug)]
pub struct WalletSession {
    manager: ConnectionManager,
    wallet: Option<Arc<dyn InjectedTransport>>,
    channel: ConnectionChannel,
    events: Option<broadcast::Receiver<WalletEvent>>,
    accounts: Vec<String>,
    on_active_network: bool,
}

impl WalletSession {
    /// Opens a session without prompting the user.
    ///
    /// Use [`accounts`](Self::accounts) afterwards to check for an existing
    /// wallet connection.
    #[must_use]
    pub fn open(manager: ConnectionManager, wallet: Option<Arc<dyn InjectedTransport>>) -> Self {
        let channel = manager.open_channel(wallet.clone());
        let events = wallet.as_ref().map(|w| w.subscribe());
        Self {
            manager,
            wallet,
            channel,
            events,
            accounts: Vec::new(),
            on_active_network: true,
        }
    }

    /// Connects: points the wallet at the active network, then asks it for
    /// accounts. The two steps never overlap, so the user sees one prompt at
    /// a time.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of either step.
    pub async fn connect(
        manager: ConnectionManager,
        wallet: Option<Arc<dyn InjectedTransport>>,
    ) -> Result<Self, ClassifiedError> {
        manager.ensure_active_network(wallet.as_deref()).await?;
        let mut session = Self::open(manager, wallet);
        if let Some(wallet) = &session.wallet {
            let value = wallet
                .request("eth_requestAccounts", json!([]))
                .await
                .map_err(|failure| classify(&failure))?;
            session.accounts = parse_accounts(value)?;
            tracing::info!(accounts = session.accounts.len(), "wallet connected");
        }
        Ok(session)
    }

    /// Accounts the wallet currently exposes (`eth_accounts`, no prompt).
    ///
    /// Empty without a wallet or when the wallet is not connected.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the wallet request.
    pub async fn accounts(&mut self) -> Result<&[String], ClassifiedError> {
        if let Some(wallet) = &self.wallet {
            let value = wallet
                .request("eth_accounts", json!([]))
                .await
                .map_err(|failure| classify(&failure))?;
            self.accounts = parse_accounts(value)?;
        }
        Ok(&self.accounts)
    }

    /// Selected account, if connected.
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.accounts.first().map(String::as_str)
    }

    /// Current channel.
    #[must_use]
    pub const fn channel(&self) -> &ConnectionChannel {
        &self.channel
    }

    /// Manager this session was opened with.
    #[must_use]
    pub const fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Whether the wallet was on the active network at the last check.
    ///
    /// Sessions created with [`open`](Self::open) start out `true`; the flag
    /// is updated by [`connect`](Self::connect), chain changes and
    /// [`send_transaction`](Self::send_transaction).
    #[must_use]
    pub const fn on_active_network(&self) -> bool {
        self.on_active_network
    }

    /// Waits for the next wallet change and recreates the channel for it.
    ///
    /// A chain change away from the active network re-runs
    /// [`ConnectionManager::ensure_active_network`]; if the wallet cannot be
    /// brought back, the classified failure is returned and
    /// [`on_active_network`](Self::on_active_network) turns `false`. After
    /// missed notifications the accounts and network are re-read from the
    /// wallet before waiting again.
    ///
    /// Returns `None` without a wallet or once the wallet closes its
    /// notification stream.
    pub async fn next_change(&mut self) -> Option<Result<WalletEvent, ClassifiedError>> {
        loop {
            let events = self.events.as_mut()?;
            match events.recv().await {
                Ok(event) => {
                    return Some(self.apply(&event).await.map(|()| event));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "missed wallet notifications, resynchronizing");
                    self.reopen();
                    if let Err(e) = self.resync().await {
                        return Some(Err(e));
                    }
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("wallet notification stream closed");
                    self.events = None;
                    return None;
                }
            }
        }
    }

    /// Submits a state-changing transaction through the wallet and waits for
    /// its receipt.
    ///
    /// The wallet is pointed at the active network first. When `tx` has no
    /// `from` field, the selected account is used. The receipt is polled
    /// until it appears; drop the future to stop waiting.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the network check, the submission,
    /// the receipt polling, or a reverted execution.
    pub async fn send_transaction(
        &mut self,
        tx: Value,
    ) -> Result<TransactionReceipt, ClassifiedError> {
        if self.wallet.is_none() {
            return Err(ClassifiedError::new(
                ErrorCategory::Unknown,
                NO_WALLET_MESSAGE,
                false,
                None,
            ));
        }
        self.check_network().await?;

        let mut tx = tx;
        if let (Some(fields), Some(account)) = (tx.as_object_mut(), self.accounts.first()) {
            fields
                .entry("from")
                .or_insert_with(|| Value::String(account.clone()));
        }
        submit_transaction(&self.channel, tx)
            .await
            .map_err(|failure| classify(&failure))
    }

    async fn apply(&mut self, event: &WalletEvent) -> Result<(), ClassifiedError> {
        self.reopen();
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                if accounts.is_empty() {
                    tracing::info!("wallet disconnected");
                } else {
                    tracing::info!(account = %accounts[0], "wallet account changed");
                }
                self.accounts.clone_from(accounts);
                Ok(())
            }
            WalletEvent::ChainChanged(chain_id) => {
                let target = self.manager.network().chain_id();
                if target.matches(chain_id) {
                    tracing::info!(%chain_id, "wallet returned to active network");
                    self.on_active_network = true;
                    Ok(())
                } else {
                    tracing::warn!(%chain_id, expected = %target, "wallet left the active network");
                    self.check_network().await
                }
            }
        }
    }

    async fn resync(&mut self) -> Result<(), ClassifiedError> {
        self.check_network().await?;
        self.accounts().await?;
        Ok(())
    }

    async fn check_network(&mut self) -> Result<(), ClassifiedError> {
        let outcome = self
            .manager
            .ensure_active_network(self.wallet.as_deref())
            .await;
        self.on_active_network = outcome.is_ok();
        outcome
    }

    fn reopen(&mut self) {
        self.channel = self.manager.open_channel(self.wallet.clone());
    }
}

fn parse_accounts(value: Value) -> Result<Vec<String>, ClassifiedError> {
    serde_json::from_value(value).map_err(|e| {
        classify(&RpcFailure::with_message(format!(
            "malformed accounts response: {e}"
        )))
    })
}
