use thiserror::Error;

use crate::domain::TransferOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Pending,
    Success,
    Failure,
}

impl TransferState {
    pub fn of(outcome: Option<&TransferOutcome>) -> Self {
        match outcome {
            None => TransferState::Idle,
            Some(TransferOutcome::Pending) => TransferState::Pending,
            Some(TransferOutcome::Success { .. }) => TransferState::Success,
            Some(TransferOutcome::Failure { .. }) => TransferState::Failure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAction {
    /// Input passed validation and the request goes to the provider.
    Submit,
    /// Input failed validation; no provider call.
    Reject,
    Confirm,
    ProviderError,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: TransferState,
    pub to: TransferState,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("illegal transfer transition: {from:?} --{action:?}-->")]
pub struct TransitionError {
    pub from: TransferState,
    pub action: TransferAction,
}

pub fn transfer_transition(
    from: TransferState,
    action: TransferAction,
) -> Result<(TransferState, StateTransition), TransitionError> {
    use TransferAction as A;
    use TransferState as S;

    let (to, reason) = match (from, action) {
        (_, A::Reset) => (S::Idle, "reset"),
        (S::Idle | S::Success | S::Failure, A::Submit) => (S::Pending, "submitted"),
        (S::Idle | S::Success | S::Failure, A::Reject) => (S::Failure, "validation_failed"),
        (S::Pending, A::Confirm) => (S::Success, "provider_accepted"),
        (S::Pending, A::ProviderError) => (S::Failure, "provider_rejected"),
        _ => return Err(TransitionError { from, action }),
    };
    Ok((to, StateTransition { from, to, reason }))
}
