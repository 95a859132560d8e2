//! Wallet session store: single source of truth for account, chain and balance.
//!
//! Every provider failure here degrades to a neutral state (disconnected or a
//! `"0"` balance) and is logged instead of returned. Callers re-read the
//! session after an operation rather than trusting its result.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::Address;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{
    ConnectionSnapshot, ProviderEvent, ProviderEventKind, WalletSession, ZERO_BALANCE,
};
use crate::ports::{parse_chain_id_str, PortError, ProviderPort};
use crate::units::{format_balance, parse_hex_quantity, UnitError};

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("no ethereum provider")]
    NoProvider,
    #[error(transparent)]
    Port(#[from] PortError),
    #[error(transparent)]
    Unit(#[from] UnitError),
}

#[derive(Debug, Default)]
struct SessionInner {
    session: WalletSession,
    fetches_in_flight: u32,
}

/// Cloneable handle; clones share the same session.
#[derive(Debug, Clone)]
pub struct SessionStore<P> {
    provider: P,
    inner: Arc<Mutex<SessionInner>>,
}

impl<P: ProviderPort> SessionStore<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            inner: Arc::new(Mutex::new(SessionInner::default())),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn snapshot(&self) -> WalletSession {
        self.lock().session.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies an account/chain report and fetches the balance if still connected.
    pub async fn observe_connection(&self, snapshot: ConnectionSnapshot) {
        if let Some(address) = self.apply_connection(snapshot) {
            self.fetch_balance(address).await;
        }
    }

    /// Synchronous half of [`Self::observe_connection`].
    ///
    /// Returns the address whose balance must be fetched, if any. A report
    /// identical to the current session changes nothing.
    pub fn apply_connection(&self, snapshot: ConnectionSnapshot) -> Option<Address> {
        let address = if self.provider.is_available() {
            snapshot.address
        } else {
            None
        };

        let mut g = self.lock();
        let session = &mut g.session;
        if session.address == address && session.chain_id == snapshot.chain_id {
            return None;
        }
        debug!(
            from_address = ?session.address,
            to_address = ?address,
            from_chain = session.chain_id,
            to_chain = snapshot.chain_id,
            "wallet connection changed"
        );

        session.address = address;
        session.chain_id = snapshot.chain_id;
        session.is_connected = address.is_some();
        session.balance_updated = false;
        if address.is_none() {
            session.balance = ZERO_BALANCE.to_owned();
        }
        address
    }

    pub async fn refresh_balance(&self) {
        let address = {
            let mut g = self.lock();
            let Some(address) = g.session.address else {
                return;
            };
            g.session.balance_updated = false;
            address
        };
        self.fetch_balance(address).await;
    }

    /// Drops the "updated" mark from the shown balance without fetching.
    pub fn mark_balance_stale(&self) {
        self.lock().session.balance_updated = false;
    }

    /// Queries and stores the balance of `address`.
    ///
    /// Overlapping fetches are not coalesced: the last one to resolve wins. A
    /// result for an address that is no longer the session's is dropped.
    pub async fn fetch_balance(&self, address: Address) {
        {
            let mut g = self.lock();
            g.fetches_in_flight = g.fetches_in_flight.saturating_add(1);
            g.session.is_loading_balance = true;
        }

        let result = self.query_balance(address).await;

        let mut g = self.lock();
        g.fetches_in_flight = g.fetches_in_flight.saturating_sub(1);
        g.session.is_loading_balance = g.fetches_in_flight > 0;
        if g.session.address != Some(address) {
            debug!(%address, "dropping balance for inactive account");
            return;
        }
        match result {
            Ok(balance) => {
                g.session.balance = balance;
                g.session.balance_updated = true;
            }
            Err(e) => {
                warn!(%address, error = %e, "Failed to fetch balance");
                g.session.balance = ZERO_BALANCE.to_owned();
                g.session.balance_updated = false;
            }
        }
    }

    async fn query_balance(&self, address: Address) -> Result<String, BalanceError> {
        if !self.provider.is_available() {
            return Err(BalanceError::NoProvider);
        }
        let raw = self.provider.get_balance(address).await?;
        let wei = parse_hex_quantity(&raw)?;
        Ok(format_balance(wei))
    }

    /// Asks the wallet to switch chains. The session only changes once the
    /// wallet reports the new chain.
    pub async fn switch_chain(&self, target_chain_id: u64) {
        if !self.provider.is_available() {
            debug!(target_chain_id, "no provider, ignoring chain switch");
            return;
        }
        if let Err(e) = self.provider.switch_chain(target_chain_id).await {
            warn!(target_chain_id, error = %e, "chain switch request failed");
        }
    }

    /// Picks up an already authorised account without prompting the user.
    pub async fn restore(&self) {
        let current_chain = self.lock().session.chain_id;
        if !self.provider.is_available() {
            self.observe_connection(ConnectionSnapshot::disconnected(current_chain))
                .await;
            return;
        }

        let address = match self.provider.accounts().await {
            Ok(accounts) => accounts.into_iter().next(),
            Err(e) => {
                warn!(error = %e, "reading authorised accounts failed");
                None
            }
        };
        let chain_id = self.provider_chain_id(current_chain).await;
        self.observe_connection(ConnectionSnapshot {
            address,
            chain_id,
        })
        .await;
    }

    /// Prompts the wallet for access and adopts its first account.
    pub async fn connect(&self) -> Result<(), PortError> {
        if !self.provider.is_available() {
            return Err(PortError::NotFound("no ethereum provider".to_owned()));
        }
        let address = self
            .provider
            .request_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PortError::Policy("wallet returned no accounts".to_owned()))?;
        let current_chain = self.lock().session.chain_id;
        let chain_id = self.provider_chain_id(current_chain).await;
        self.observe_connection(ConnectionSnapshot::connected(address, chain_id))
            .await;
        Ok(())
    }

    /// Forgets the account locally. The wallet's own authorisation is untouched.
    pub fn disconnect(&self) {
        let chain_id = self.lock().session.chain_id;
        let _ = self.apply_connection(ConnectionSnapshot::disconnected(chain_id));
    }

    async fn provider_chain_id(&self, fallback: u64) -> u64 {
        match self.provider.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(e) => {
                warn!(error = %e, fallback, "reading chain id failed");
                fallback
            }
        }
    }

    /// Folds provider events into the connection they describe.
    ///
    /// Returns `None` when the events leave account and chain as they are.
    /// Malformed events are logged and skipped.
    pub fn apply_provider_events(&self, events: &[ProviderEvent]) -> Option<ConnectionSnapshot> {
        let current = {
            let g = self.lock();
            ConnectionSnapshot {
                address: g.session.address,
                chain_id: g.session.chain_id,
            }
        };

        let mut next = current;
        for event in events {
            match event.kind {
                ProviderEventKind::AccountsChanged => {
                    match serde_json::from_str::<Vec<String>>(&event.value) {
                        Ok(accounts) => {
                            next.address = accounts.first().and_then(|raw| raw.parse().ok());
                        }
                        Err(e) => warn!(sequence = event.sequence, error = %e, "bad accountsChanged payload"),
                    }
                }
                ProviderEventKind::ChainChanged => match parse_chain_id_str(&event.value) {
                    Ok(chain_id) => next.chain_id = chain_id,
                    Err(e) => warn!(sequence = event.sequence, error = %e, "bad chainChanged payload"),
                },
            }
        }

        (next != current).then_some(next)
    }

    /// Drains provider events and applies them.
    ///
    /// Returns the address whose balance must now be fetched, if any.
    pub fn poll_provider_events(&self) -> Option<Address> {
        let events = match self.provider.drain_events() {
            Ok(events) => events,
            Err(e) => {
                debug!(error = %e, "provider events unavailable");
                return None;
            }
        };
        if events.is_empty() {
            return None;
        }
        let snapshot = self.apply_provider_events(&events)?;
        self.apply_connection(snapshot)
    }
}
