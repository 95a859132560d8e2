//! Supported chains and the chain selector.

use std::borrow::Cow;

use crate::domain::ChainDescriptor;

struct SupportedChain {
    id: u64,
    name: &'static str,
    icon: &'static str,
    explorer: &'static str,
}

const SUPPORTED_CHAINS: &[SupportedChain] = &[
    SupportedChain {
        id: 1,
        name: "Ethereum Mainnet",
        icon: "⟠",
        explorer: "https://etherscan.io",
    },
    SupportedChain {
        id: 137,
        name: "Polygon",
        icon: "⬡",
        explorer: "https://polygonscan.com",
    },
    SupportedChain {
        id: 10,
        name: "Optimism",
        icon: "🔴",
        explorer: "https://optimistic.etherscan.io",
    },
    SupportedChain {
        id: 42161,
        name: "Arbitrum",
        icon: "🔵",
        explorer: "https://arbiscan.io",
    },
    SupportedChain {
        id: 8453,
        name: "Base",
        icon: "🔷",
        explorer: "https://basescan.org",
    },
    SupportedChain {
        id: 4202,
        name: "Lisk Sepolia",
        icon: "🟣",
        explorer: "https://sepolia-blockscout.lisk.com",
    },
];

/// Glyph for chains outside the supported list.
pub const UNKNOWN_CHAIN_ICON: &str = "⚡";

impl SupportedChain {
    fn descriptor(&self) -> ChainDescriptor {
        ChainDescriptor {
            id: self.id,
            display_name: Cow::Borrowed(self.name),
            icon: self.icon,
            block_explorer_base_url: Some(self.explorer),
        }
    }
}

/// Supported chains in display order.
pub fn supported_chains() -> Vec<ChainDescriptor> {
    SUPPORTED_CHAINS.iter().map(SupportedChain::descriptor).collect()
}

pub fn is_supported(chain_id: u64) -> bool {
    SUPPORTED_CHAINS.iter().any(|c| c.id == chain_id)
}

/// Descriptor for `chain_id`, synthesized as `Chain {id}` when unknown.
pub fn resolve_chain(chain_id: u64) -> ChainDescriptor {
    SUPPORTED_CHAINS
        .iter()
        .find(|c| c.id == chain_id)
        .map(SupportedChain::descriptor)
        .unwrap_or_else(|| ChainDescriptor {
            id: chain_id,
            display_name: Cow::Owned(format!("Chain {chain_id}")),
            icon: UNKNOWN_CHAIN_ICON,
            block_explorer_base_url: None,
        })
}

pub fn explorer_tx_url(chain_id: u64, tx_hash: &str) -> Option<String> {
    resolve_chain(chain_id)
        .block_explorer_base_url
        .map(|base| format!("{base}/tx/{tx_hash}"))
}

pub fn explorer_address_url(chain_id: u64, address: &str) -> Option<String> {
    resolve_chain(chain_id)
        .block_explorer_base_url
        .map(|base| format!("{base}/address/{address}"))
}

/// Dropdown state for picking a chain.
///
/// Selecting never checks that the wallet can reach the target chain; the
/// wallet reports the outcome later through a chain change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSelector {
    open: bool,
}

impl ChainSelector {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Closes the dropdown and returns the chain to switch to.
    pub fn select(&mut self, target_chain_id: u64) -> u64 {
        self.open = false;
        target_chain_id
    }
}
