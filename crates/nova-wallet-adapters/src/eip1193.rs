use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{keccak256, Address, U256};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use nova_wallet_core::chains::is_supported;
use nova_wallet_core::domain::{address_hex, DEFAULT_CHAIN_ID};
use nova_wallet_core::ports::{json_chain_id_to_u64, parse_accounts, parse_chain_id_str};
use nova_wallet_core::units::{parse_hex_quantity, to_hex_quantity};
use nova_wallet_core::{PortError, ProviderEvent, ProviderEventKind, ProviderPort};

use crate::WalletAdapterConfig;

/// The single account exposed by the deterministic runtime.
pub const DETERMINISTIC_ACCOUNT: &str = "0x1000000000000000000000000000000000000001";

/// 10 ETH in wei.
const DETERMINISTIC_BALANCE_WEI: u128 = 10_000_000_000_000_000_000;

// EIP-1193 / EIP-1474 error codes used by the deterministic runtime.
const UNAUTHORIZED: i64 = 4100;
const UNSUPPORTED_METHOD: i64 = 4200;
const UNRECOGNIZED_CHAIN: i64 = 4902;
const INVALID_PARAMS: i64 = -32602;
const INSUFFICIENT_FUNDS: i64 = -32000;

#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
    #[cfg(target_arch = "wasm32")]
    hooks: Arc<Mutex<BrowserHooks>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    #[cfg(not(target_arch = "wasm32"))]
    Proxy(ProxyRuntime),
    #[cfg(target_arch = "wasm32")]
    Browser,
}

#[derive(Debug, Clone)]
#[cfg(not(target_arch = "wasm32"))]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
}

/// Last known wallet view. For the deterministic runtime this is the wallet
/// itself; for the remote runtimes it caches what the wallet last reported so
/// that changes can be turned into events.
#[derive(Debug, Clone)]
struct ProviderState {
    accounts: Vec<Address>,
    chain_id: u64,
    balance: U256,
    event_seq: u64,
    events: Vec<ProviderEvent>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            chain_id: DEFAULT_CHAIN_ID,
            balance: U256::from(DETERMINISTIC_BALANCE_WEI),
            event_seq: 0,
            events: Vec::new(),
        }
    }
}

impl ProviderState {
    fn push_event(&mut self, kind: ProviderEventKind, value: String) {
        self.event_seq = self.event_seq.saturating_add(1);
        self.events.push(ProviderEvent {
            sequence: self.event_seq,
            kind,
            value,
        });
    }

    fn set_accounts(&mut self, accounts: Vec<Address>) {
        if self.accounts == accounts {
            return;
        }
        let payload = accounts_payload(&accounts);
        self.accounts = accounts;
        self.push_event(ProviderEventKind::AccountsChanged, payload);
    }

    fn set_chain_id(&mut self, chain_id: u64) {
        if self.chain_id == chain_id {
            return;
        }
        self.chain_id = chain_id;
        self.push_event(ProviderEventKind::ChainChanged, format!("0x{chain_id:x}"));
    }
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
struct BrowserHooks {
    accounts_changed: Option<wasm_bindgen::closure::Closure<dyn FnMut(wasm_bindgen::JsValue)>>,
    chain_changed: Option<wasm_bindgen::closure::Closure<dyn FnMut(wasm_bindgen::JsValue)>>,
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(WalletAdapterConfig::from_env())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: WalletAdapterConfig) -> Self {
        #[cfg(target_arch = "wasm32")]
        let mode = if browser_provider().is_ok() {
            ProviderMode::Browser
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled("window.ethereum not found".to_owned())
        } else {
            ProviderMode::Deterministic
        };

        #[cfg(not(target_arch = "wasm32"))]
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            let timeout = std::time::Duration::from_millis(config.provider_timeout_ms);
            match reqwest::Client::builder().timeout(timeout).build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) if config.strict_runtime_required() => ProviderMode::Disabled(format!(
                    "failed to initialize EIP-1193 proxy client: {e}"
                )),
                Err(e) => {
                    tracing::warn!(error = %e, "proxy client unavailable, using deterministic wallet");
                    ProviderMode::Deterministic
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled("EIP-1193 proxy URL not configured".to_owned())
        } else {
            ProviderMode::Deterministic
        };

        let adapter = Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
            #[cfg(target_arch = "wasm32")]
            hooks: Arc::new(Mutex::new(BrowserHooks::default())),
        };
        info!(mode = adapter.mode_label(), "ethereum provider initialised");
        adapter
    }

    /// Short name of the active runtime, for logs and the status line.
    pub fn mode_label(&self) -> &'static str {
        match &self.mode {
            ProviderMode::Disabled(_) => "disabled",
            ProviderMode::Deterministic => "deterministic",
            #[cfg(not(target_arch = "wasm32"))]
            ProviderMode::Proxy(_) => "proxy",
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser => "browser",
        }
    }

    pub fn disabled_reason(&self) -> Option<&str> {
        match &self.mode {
            ProviderMode::Disabled(reason) => Some(reason),
            _ => None,
        }
    }

    /// Whether wallet-side changes only show up by asking the wallet again.
    /// The proxy has no push channel; the other runtimes record events as
    /// they happen.
    pub fn polls_wallet(&self) -> bool {
        #[cfg(not(target_arch = "wasm32"))]
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            return true;
        }
        false
    }

    /// Re-reads accounts and chain from a polled wallet so that changes made
    /// in the wallet itself are recorded as events. A no-op for the other
    /// runtimes.
    pub async fn sync_wallet_view(&self) -> Result<(), PortError> {
        if !self.polls_wallet() {
            return Ok(());
        }
        self.accounts().await?;
        self.chain_id().await?;
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        self.lock_state()?.set_accounts(accounts);
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<(), PortError> {
        self.lock_state()?.set_chain_id(chain_id);
        Ok(())
    }

    /// Remaining balance of the deterministic account.
    pub fn debug_balance(&self) -> Result<U256, PortError> {
        Ok(self.lock_state()?.balance)
    }

    fn deterministic_request(&self, method: &str, params: &Value) -> Result<Value, PortError> {
        let mut g = self.lock_state()?;
        match method {
            "eth_accounts" => Ok(accounts_json(&g.accounts)),
            "eth_requestAccounts" => {
                if g.accounts.is_empty() {
                    Ok(accounts_json(&[deterministic_account()]))
                } else {
                    Ok(accounts_json(&g.accounts))
                }
            }
            "eth_chainId" => Ok(Value::String(format!("0x{:x}", g.chain_id))),
            "eth_getBalance" => {
                let owner = first_param_str(params)
                    .and_then(|raw| raw.parse::<Address>().ok())
                    .ok_or_else(|| invalid_params("eth_getBalance expects an address"))?;
                let balance = if owner == deterministic_account() {
                    g.balance
                } else {
                    U256::ZERO
                };
                Ok(Value::String(to_hex_quantity(balance)))
            }
            "eth_sendTransaction" => {
                let tx = params
                    .get(0)
                    .ok_or_else(|| invalid_params("eth_sendTransaction expects a transaction"))?;
                let from = tx
                    .get("from")
                    .and_then(Value::as_str)
                    .and_then(|raw| raw.parse::<Address>().ok())
                    .ok_or_else(|| invalid_params("transaction is missing from"))?;
                if !g.accounts.contains(&from) {
                    return Err(PortError::Rpc {
                        code: UNAUTHORIZED,
                        message: "The requested account and/or method has not been authorized by the user."
                            .to_owned(),
                    });
                }
                let value = match tx.get("value").and_then(Value::as_str) {
                    Some(raw) => parse_hex_quantity(raw)
                        .map_err(|e| invalid_params(&format!("invalid value: {e}")))?,
                    None => U256::ZERO,
                };
                if from == deterministic_account() {
                    g.balance = g.balance.checked_sub(value).ok_or_else(|| PortError::Rpc {
                        code: INSUFFICIENT_FUNDS,
                        message: "insufficient funds for transfer".to_owned(),
                    })?;
                }
                let canonical = serde_json::to_vec(tx).map_err(|e| {
                    PortError::Validation(format!("tx payload serialization failed: {e}"))
                })?;
                Ok(Value::String(keccak256(canonical).to_string()))
            }
            "wallet_switchEthereumChain" => {
                let chain_id = switch_target(params)?;
                if !is_supported(chain_id) {
                    return Err(PortError::Rpc {
                        code: UNRECOGNIZED_CHAIN,
                        message: format!(
                            "Unrecognized chain ID \"0x{chain_id:x}\". Try adding the chain using wallet_addEthereumChain first."
                        ),
                    });
                }
                Ok(Value::Null)
            }
            other => Err(PortError::Rpc {
                code: UNSUPPORTED_METHOD,
                message: format!("Unsupported method: {other}"),
            }),
        }
    }

    /// Updates the cached wallet view from a successful response and records
    /// an event for every change.
    fn observe_result(&self, method: &str, params: &Value, result: &Value) -> Result<(), PortError> {
        match method {
            "eth_accounts" | "eth_requestAccounts" => {
                let accounts = parse_accounts(method, result)?;
                self.lock_state()?.set_accounts(accounts);
            }
            "eth_chainId" => {
                let chain_id = json_chain_id_to_u64(result)?;
                self.lock_state()?.set_chain_id(chain_id);
            }
            "wallet_switchEthereumChain" => {
                let chain_id = switch_target(params)?;
                self.lock_state()?.set_chain_id(chain_id);
            }
            _ => {}
        }
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn proxy_call(proxy: &ProxyRuntime, method: &str, params: Value) -> Result<Value, PortError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(rpc_error_from_json(err));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
    }

    #[cfg(target_arch = "wasm32")]
    async fn wasm_request(method: &str, params: Value) -> Result<Value, PortError> {
        use serde::Serialize;
        use wasm_bindgen::JsCast;

        let provider = browser_provider()?;
        let request_fn = get_prop(&provider, "request")
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
            .ok_or(PortError::NotImplemented(
                "window.ethereum.request is unavailable",
            ))?;

        let request = serde_json::json!({
            "method": method,
            "params": params,
        });
        // Plain objects, not `Map`s: wallets read `request.method` directly.
        let request_js = request
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| PortError::Transport(format!("failed to encode wasm request: {e}")))?;
        let promise_js = request_fn
            .call1(&provider, &request_js)
            .map_err(js_error_to_port)?;
        let promise = promise_js.dyn_into::<js_sys::Promise>().map_err(|_| {
            PortError::Transport("provider request did not return Promise".to_owned())
        })?;
        let result_js = wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(js_error_to_port)?;
        if result_js.is_undefined() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result_js)
            .map_err(|e| PortError::Transport(format!("failed to decode wasm response: {e}")))
    }

    /// Subscribes to `accountsChanged` and `chainChanged` once. Registration
    /// waits for the first authorised account: some wallets leave
    /// `eth_requestAccounts` hanging when listeners are attached earlier.
    #[cfg(target_arch = "wasm32")]
    fn register_browser_hooks(&self) -> Result<(), PortError> {
        use wasm_bindgen::{closure::Closure, JsCast, JsValue};

        let mut hooks = self
            .hooks
            .lock()
            .map_err(|e| PortError::Transport(format!("provider hooks lock poisoned: {e}")))?;
        if hooks.accounts_changed.is_some() && hooks.chain_changed.is_some() {
            return Ok(());
        }

        let provider = browser_provider()?;
        let on_fn = get_prop(&provider, "on")
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
            .or_else(|| {
                get_prop(&provider, "addListener")
                    .ok()
                    .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
            })
            .ok_or(PortError::NotImplemented(
                "provider does not expose on/addListener",
            ))?;

        let state_for_accounts = Arc::clone(&self.state);
        let accounts_cb = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let mut accounts = Vec::new();
            if js_sys::Array::is_array(&value) {
                for item in js_sys::Array::from(&value).iter() {
                    if let Some(addr) = item.as_string().and_then(|raw| raw.parse().ok()) {
                        accounts.push(addr);
                    }
                }
            }
            if let Ok(mut g) = state_for_accounts.lock() {
                g.set_accounts(accounts);
            }
        });

        let state_for_chain = Arc::clone(&self.state);
        let chain_cb = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            if let Ok(chain_id) = js_chain_id_to_u64(value) {
                if let Ok(mut g) = state_for_chain.lock() {
                    g.set_chain_id(chain_id);
                }
            }
        });

        on_fn
            .call2(
                &provider,
                &JsValue::from_str("accountsChanged"),
                accounts_cb.as_ref().unchecked_ref(),
            )
            .map_err(|e| PortError::Transport(format!("register accountsChanged failed: {e:?}")))?;
        on_fn
            .call2(
                &provider,
                &JsValue::from_str("chainChanged"),
                chain_cb.as_ref().unchecked_ref(),
            )
            .map_err(|e| PortError::Transport(format!("register chainChanged failed: {e:?}")))?;

        hooks.accounts_changed = Some(accounts_cb);
        hooks.chain_changed = Some(chain_cb);
        debug!("browser provider listeners registered");
        Ok(())
    }
}

#[async_trait(?Send)]
impl ProviderPort for Eip1193Adapter {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        debug!(method, mode = self.mode_label(), "provider request");
        let result = match &self.mode {
            ProviderMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
            ProviderMode::Deterministic => self.deterministic_request(method, &params)?,
            #[cfg(not(target_arch = "wasm32"))]
            ProviderMode::Proxy(proxy) => Self::proxy_call(proxy, method, params.clone()).await?,
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser => Self::wasm_request(method, params.clone()).await?,
        };
        self.observe_result(method, &params, &result)?;

        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) && !self.lock_state()?.accounts.is_empty() {
            if let Err(e) = self.register_browser_hooks() {
                tracing::warn!(error = %e, "provider listeners unavailable");
            }
        }

        Ok(result)
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(std::mem::take(&mut self.lock_state()?.events))
    }

    fn is_available(&self) -> bool {
        !matches!(self.mode, ProviderMode::Disabled(_))
    }
}

fn deterministic_account() -> Address {
    DETERMINISTIC_ACCOUNT
        .parse()
        .expect("valid built-in deterministic account")
}

fn accounts_json(accounts: &[Address]) -> Value {
    Value::Array(
        accounts
            .iter()
            .map(|a| Value::String(address_hex(*a)))
            .collect(),
    )
}

fn accounts_payload(accounts: &[Address]) -> String {
    accounts_json(accounts).to_string()
}

fn first_param_str(params: &Value) -> Option<&str> {
    params.get(0).and_then(Value::as_str)
}

fn switch_target(params: &Value) -> Result<u64, PortError> {
    let raw = params
        .get(0)
        .and_then(|p| p.get("chainId"))
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_params("wallet_switchEthereumChain expects [{ chainId }]"))?;
    parse_chain_id_str(raw)
}

fn invalid_params(message: &str) -> PortError {
    PortError::Rpc {
        code: INVALID_PARAMS,
        message: message.to_owned(),
    }
}

/// Maps a JSON-RPC `error` object; a missing message stays empty so the
/// caller falls back to its generic text.
fn rpc_error_from_json(err: &Value) -> PortError {
    PortError::Rpc {
        code: err.get("code").and_then(Value::as_i64).unwrap_or(-32603),
        message: err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
    }
}

#[cfg(target_arch = "wasm32")]
fn browser_provider() -> Result<wasm_bindgen::JsValue, PortError> {
    let window =
        web_sys::window().ok_or_else(|| PortError::Transport("missing window".to_owned()))?;
    let provider = get_prop(&window.into(), "ethereum")?;
    if provider.is_null() || provider.is_undefined() {
        return Err(PortError::NotFound("window.ethereum missing".to_owned()));
    }
    Ok(provider)
}

#[cfg(target_arch = "wasm32")]
fn get_prop(target: &wasm_bindgen::JsValue, key: &str) -> Result<wasm_bindgen::JsValue, PortError> {
    js_sys::Reflect::get(target, &wasm_bindgen::JsValue::from_str(key))
        .map_err(|e| PortError::Transport(format!("read provider property {key} failed: {e:?}")))
}

/// Wallet rejections are `{ code, message }` objects; anything else is a
/// transport failure.
#[cfg(target_arch = "wasm32")]
fn js_error_to_port(err: wasm_bindgen::JsValue) -> PortError {
    if let Some(message) = err.as_string() {
        return PortError::Transport(message);
    }
    if !err.is_object() {
        return PortError::Transport(format!("{err:?}"));
    }
    let code = get_prop(&err, "code").ok().and_then(|v| v.as_f64());
    let message = get_prop(&err, "message").ok().and_then(|v| v.as_string());
    match (code, message) {
        (None, None) => PortError::Transport(format!("{err:?}")),
        (code, message) => PortError::Rpc {
            code: code.map(|c| c as i64).unwrap_or(-32603),
            message: message.unwrap_or_default(),
        },
    }
}

#[cfg(target_arch = "wasm32")]
fn js_chain_id_to_u64(value: wasm_bindgen::JsValue) -> Result<u64, PortError> {
    if let Some(s) = value.as_string() {
        return parse_chain_id_str(&s);
    }
    if let Some(num) = value.as_f64() {
        return Ok(num as u64);
    }
    Err(PortError::Validation("invalid JS chain id".to_owned()))
}
