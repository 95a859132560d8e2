use std::time::Duration;

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{address_hex, ProviderEvent, TransactionRequest};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl PortError {
    /// Message worth showing to a user, if the error carries one.
    pub fn user_message(&self) -> Option<String> {
        let message = match self {
            PortError::NotImplemented(m) => (*m).to_owned(),
            PortError::Rpc { message, .. } => message.clone(),
            PortError::Transport(m)
            | PortError::Validation(m)
            | PortError::Policy(m)
            | PortError::NotFound(m) => m.clone(),
        };
        let message = message.trim();
        (!message.is_empty()).then(|| message.to_owned())
    }
}

/// The injected wallet: one request/response call plus change events.
#[async_trait(?Send)]
pub trait ProviderPort {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError>;

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, PortError>;

    fn is_available(&self) -> bool {
        true
    }

    /// Accounts already authorised for this origin, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, PortError> {
        let result = self.request("eth_accounts", serde_json::json!([])).await?;
        parse_accounts("eth_accounts", &result)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        let result = self
            .request("eth_requestAccounts", serde_json::json!([]))
            .await?;
        parse_accounts("eth_requestAccounts", &result)
    }

    async fn chain_id(&self) -> Result<u64, PortError> {
        let result = self.request("eth_chainId", serde_json::json!([])).await?;
        json_chain_id_to_u64(&result)
    }

    /// Raw hex quantity as returned by `eth_getBalance`.
    async fn get_balance(&self, address: Address) -> Result<String, PortError> {
        let result = self
            .request(
                "eth_getBalance",
                serde_json::json!([address_hex(address), "latest"]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| PortError::Transport("eth_getBalance must return hex string".to_owned()))
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, PortError> {
        let result = self
            .request("eth_sendTransaction", serde_json::json!([tx]))
            .await?;
        let hash = result.as_str().ok_or_else(|| {
            PortError::Transport("eth_sendTransaction must return tx hash".to_owned())
        })?;
        hash.parse()
            .map_err(|e| PortError::Validation(format!("invalid tx hash: {e}")))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), PortError> {
        self.request(
            "wallet_switchEthereumChain",
            serde_json::json!([{ "chainId": format!("0x{chain_id:x}") }]),
        )
        .await?;
        Ok(())
    }
}

/// Balance bookkeeping around a transfer.
pub trait RefreshScheduler {
    /// The shown balance is about to change; called as a send goes out.
    fn mark_balance_stale(&self);

    /// Runs one balance refresh after `delay` without blocking the caller.
    fn schedule_balance_refresh(&self, delay: Duration);
}

pub fn parse_accounts(method: &str, value: &Value) -> Result<Vec<Address>, PortError> {
    let arr = value
        .as_array()
        .ok_or_else(|| PortError::Transport(format!("{method}: array expected")))?;
    let mut accounts = Vec::with_capacity(arr.len());
    for item in arr {
        let raw = item
            .as_str()
            .ok_or_else(|| PortError::Transport(format!("{method}: string expected")))?;
        let parsed: Address = raw
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))?;
        accounts.push(parsed);
    }
    Ok(accounts)
}

pub fn json_chain_id_to_u64(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("chain id must be string or number".to_owned()))?;
    parse_chain_id_str(s)
}

pub fn parse_chain_id_str(raw: &str) -> Result<u64, PortError> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex chain id: {e}")))
    } else {
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid chain id: {e}")))
    }
}
