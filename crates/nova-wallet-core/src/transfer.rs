//! Transfer form controller: validates one native transfer and hands it to the wallet.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::primitives::Address;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    address_hex, TransactionRequest, TransferOutcome, TransferRequest, NATIVE_TRANSFER_GAS,
};
use crate::ports::{ProviderPort, RefreshScheduler};
use crate::state_machine::{transfer_transition, TransferAction, TransferState};
use crate::units::{parse_ether_amount, to_hex_quantity, UnitError};
use crate::validation::is_valid_recipient;

/// Delay between an accepted transfer and the balance re-read.
pub const BALANCE_REFRESH_DELAY: Duration = Duration::from_millis(2_000);

/// Shown when the provider error carries no message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Transaction failed";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Invalid recipient address")]
    InvalidRecipient,
    #[error("Wallet is not connected.")]
    NotConnected,
    #[error("MetaMask is not installed. Please install MetaMask to use this app.")]
    ProviderMissing,
    #[error("Invalid amount")]
    InvalidAmount(#[source] UnitError),
}

/// Checks the form in order (first failure wins) and builds the provider request.
pub fn build_transaction(
    request: &TransferRequest,
    from: Option<Address>,
    provider_available: bool,
) -> Result<TransactionRequest, TransferError> {
    if request.recipient.is_empty() || request.amount.is_empty() {
        return Err(TransferError::MissingFields);
    }
    if !is_valid_recipient(&request.recipient) {
        return Err(TransferError::InvalidRecipient);
    }
    let from = from.ok_or(TransferError::NotConnected)?;
    if !provider_available {
        return Err(TransferError::ProviderMissing);
    }
    let wei = parse_ether_amount(&request.amount).map_err(TransferError::InvalidAmount)?;

    Ok(TransactionRequest {
        from: address_hex(from),
        to: request.recipient.clone(),
        value: to_hex_quantity(wei),
        gas: NATIVE_TRANSFER_GAS.to_owned(),
    })
}

/// Read-only copy of the form for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferForm {
    pub request: TransferRequest,
    pub outcome: Option<TransferOutcome>,
}

impl TransferForm {
    pub fn state(&self) -> TransferState {
        TransferState::of(self.outcome.as_ref())
    }

    pub fn is_pending(&self) -> bool {
        self.state() == TransferState::Pending
    }

    /// Whether the send button should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_pending() && !self.request.recipient.is_empty() && !self.request.amount.is_empty()
    }
}

#[derive(Debug, Default)]
struct FormInner {
    form: TransferForm,
    /// Bumped by every submit and reset; a provider result is only recorded
    /// while its attempt is still current.
    attempt: u64,
}

impl FormInner {
    fn advance(&mut self, action: TransferAction, outcome: Option<TransferOutcome>) -> bool {
        match transfer_transition(self.form.state(), action) {
            Ok((_, transition)) => {
                debug!(
                    from = ?transition.from,
                    to = ?transition.to,
                    reason = transition.reason,
                    "transfer transition"
                );
                self.form.outcome = outcome;
                true
            }
            Err(e) => {
                warn!(error = %e, "ignoring transfer action");
                false
            }
        }
    }
}

/// Cloneable handle; clones share the same form.
#[derive(Debug, Clone)]
pub struct TransferController<P> {
    provider: P,
    inner: Arc<Mutex<FormInner>>,
    refresh_delay: Duration,
}

impl<P: ProviderPort> TransferController<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            inner: Arc::new(Mutex::new(FormInner::default())),
            refresh_delay: BALANCE_REFRESH_DELAY,
        }
    }

    pub fn with_refresh_delay(mut self, refresh_delay: Duration) -> Self {
        self.refresh_delay = refresh_delay;
        self
    }

    fn lock(&self) -> MutexGuard<'_, FormInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn form(&self) -> TransferForm {
        self.lock().form.clone()
    }

    pub fn set_recipient(&self, recipient: impl Into<String>) {
        self.lock().form.request.recipient = recipient.into();
    }

    pub fn set_amount(&self, amount: impl Into<String>) {
        self.lock().form.request.amount = amount.into();
    }

    /// Clears input and outcome. An in-flight request keeps running but its
    /// result is no longer shown.
    pub fn reset(&self) {
        let mut g = self.lock();
        g.attempt = g.attempt.wrapping_add(1);
        g.form.request.clear();
        g.advance(TransferAction::Reset, None);
    }

    /// Validates the form and sends the transfer from `from`.
    ///
    /// The shown balance is marked stale once the send goes out. On acceptance
    /// the form is cleared and one balance refresh is handed to `scheduler`. On rejection the input is kept so the user can retry. A
    /// submit while another is pending is ignored.
    pub async fn submit<S>(&self, from: Option<Address>, scheduler: &S) -> TransferOutcome
    where
        S: RefreshScheduler + ?Sized,
    {
        let (attempt, tx) = {
            let mut g = self.lock();
            if g.form.is_pending() {
                debug!("transfer already pending, ignoring submit");
                return TransferOutcome::Pending;
            }
            match build_transaction(&g.form.request, from, self.provider.is_available()) {
                Ok(tx) => {
                    g.attempt = g.attempt.wrapping_add(1);
                    g.advance(TransferAction::Submit, Some(TransferOutcome::Pending));
                    (g.attempt, tx)
                }
                Err(e) => {
                    debug!(error = ?e, "transfer rejected before sending");
                    let outcome = TransferOutcome::Failure {
                        message: e.to_string(),
                    };
                    g.advance(TransferAction::Reject, Some(outcome.clone()));
                    return outcome;
                }
            }
        };

        scheduler.mark_balance_stale();
        info!(from = %tx.from, to = %tx.to, value = %tx.value, "sending transfer");
        let result = self.provider.send_transaction(&tx).await;

        let (action, outcome) = match &result {
            Ok(hash) => (
                TransferAction::Confirm,
                TransferOutcome::Success {
                    transaction_hash: *hash,
                },
            ),
            Err(e) => {
                warn!(error = %e, "transfer failed");
                (
                    TransferAction::ProviderError,
                    TransferOutcome::Failure {
                        message: e
                            .user_message()
                            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_owned()),
                    },
                )
            }
        };

        {
            let mut g = self.lock();
            if g.attempt == attempt {
                if g.advance(action, Some(outcome.clone())) && result.is_ok() {
                    g.form.request.clear();
                }
            } else {
                debug!(attempt, "dropping outcome of superseded transfer");
            }
        }

        if result.is_ok() {
            scheduler.schedule_balance_refresh(self.refresh_delay);
        }
        outcome
    }
}
