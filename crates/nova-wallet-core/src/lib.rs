pub mod chains;
pub mod domain;
pub mod ports;
pub mod session;
pub mod state_machine;
pub mod transfer;
pub mod units;
pub mod validation;

pub use chains::{resolve_chain, supported_chains, ChainSelector};
pub use domain::{
    ChainDescriptor, ConnectionSnapshot, ProviderEvent, ProviderEventKind, TransactionRequest,
    TransferOutcome, TransferRequest, WalletSession,
};
pub use ports::{PortError, ProviderPort, RefreshScheduler};
pub use session::SessionStore;
pub use state_machine::{TransferAction, TransferState};
pub use transfer::{TransferController, TransferError, TransferForm};
