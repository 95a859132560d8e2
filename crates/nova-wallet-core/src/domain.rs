use std::borrow::Cow;

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Chain the session reports before any provider has been observed.
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Balance shown whenever no valid balance is known.
pub const ZERO_BALANCE: &str = "0";

/// Gas limit for a plain native transfer (21000).
pub const NATIVE_TRANSFER_GAS: &str = "0x5208";

/// Connection, chain and balance state of the current tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub address: Option<Address>,
    pub is_connected: bool,
    pub chain_id: u64,
    /// Decimal string with six fractional digits, or `"0"` when unknown.
    pub balance: String,
    pub balance_updated: bool,
    pub is_loading_balance: bool,
}

impl Default for WalletSession {
    fn default() -> Self {
        Self {
            address: None,
            is_connected: false,
            chain_id: DEFAULT_CHAIN_ID,
            balance: ZERO_BALANCE.to_owned(),
            balance_updated: false,
            is_loading_balance: false,
        }
    }
}

impl WalletSession {
    /// Lowercase `0x`-prefixed address, empty when disconnected.
    pub fn address_hex(&self) -> String {
        self.address.map(address_hex).unwrap_or_default()
    }
}

pub fn address_hex(address: Address) -> String {
    alloy::hex::encode_prefixed(address.as_slice())
}

/// What the provider currently reports about account and chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub address: Option<Address>,
    pub chain_id: u64,
}

impl ConnectionSnapshot {
    pub fn connected(address: Address, chain_id: u64) -> Self {
        Self {
            address: Some(address),
            chain_id,
        }
    }

    pub fn disconnected(chain_id: u64) -> Self {
        Self {
            address: None,
            chain_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDescriptor {
    pub id: u64,
    pub display_name: Cow<'static, str>,
    pub icon: &'static str,
    pub block_explorer_base_url: Option<&'static str>,
}

/// Transient form input, amount in whole coins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferRequest {
    pub recipient: String,
    pub amount: String,
}

impl TransferRequest {
    pub fn clear(&mut self) {
        self.recipient.clear();
        self.amount.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Pending,
    Success { transaction_hash: B256 },
    Failure { message: String },
}

/// `eth_sendTransaction` parameter object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    pub value: String,
    pub gas: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEvent {
    pub sequence: u64,
    pub kind: ProviderEventKind,
    /// JSON array of accounts for `AccountsChanged`, hex or decimal chain id for `ChainChanged`.
    pub value: String,
}
