#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use alloy::primitives::Address;
use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use nova_wallet_adapters::{Eip1193Adapter, WalletAdapterConfig};
use nova_wallet_core::RefreshScheduler;

pub const ONE_AND_A_HALF_ETHER_HEX: &str = "0x14d1120d7b160000";
pub const TX_HASH: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

pub fn deterministic_adapter() -> Eip1193Adapter {
    Eip1193Adapter::with_config(WalletAdapterConfig::default())
}

pub fn proxy_adapter(base_url: String) -> Eip1193Adapter {
    Eip1193Adapter::with_config(WalletAdapterConfig {
        eip1193_proxy_url: Some(base_url),
        provider_timeout_ms: 5_000,
        ..WalletAdapterConfig::default()
    })
}

pub fn wallet_account() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid wallet account")
}

pub fn other_account() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("valid other account")
}

pub fn recipient() -> String {
    "0x000000000000000000000000000000000000CAFE".to_owned()
}

#[derive(Debug, Default)]
pub struct RecordingScheduler {
    pub stale_marks: Mutex<u32>,
    pub delays: Mutex<Vec<Duration>>,
}

impl RecordingScheduler {
    pub fn stale_marks(&self) -> u32 {
        *self.stale_marks.lock().expect("stale lock")
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().expect("delays lock").clone()
    }
}

impl RefreshScheduler for RecordingScheduler {
    fn mark_balance_stale(&self) {
        *self.stale_marks.lock().expect("stale lock") += 1;
    }

    fn schedule_balance_refresh(&self, delay: Duration) {
        self.delays.lock().expect("delays lock").push(delay);
    }
}

/// JSON-RPC request bodies received by the mock wallet, in arrival order.
pub type RecordedCalls = Arc<Mutex<Vec<Value>>>;

/// Mock wallet proxy answering JSON-RPC by method name.
///
/// `answer` returns `(http_status, body)` for a method and its params.
pub fn spawn_mock_rpc_server<F>(answer: F) -> (String, RecordedCalls)
where
    F: Fn(&str, &Value) -> (u16, Value) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());
    let calls: RecordedCalls = Arc::default();
    let recorded = Arc::clone(&calls);

    thread::spawn(move || {
        for _ in 0..32 {
            let mut req = match server.recv() {
                Ok(r) => r,
                Err(_) => break,
            };
            let mut body = String::new();
            let _ = req.as_reader().read_to_string(&mut body);
            let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let method = payload
                .get("method")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            let params = payload.get("params").cloned().unwrap_or(json!([]));
            if let Ok(mut g) = recorded.lock() {
                g.push(payload.clone());
            }

            let (code, response) = answer(&method, &params);
            let response =
                Response::from_string(response.to_string()).with_status_code(StatusCode(code));
            let _ = req.respond(response);
        }
    });

    (addr, calls)
}

pub fn rpc_result(result: Value) -> (u16, Value) {
    (200, json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
}

pub fn rpc_error(code: i64, message: &str) -> (u16, Value) {
    (
        200,
        json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": code, "message": message } }),
    )
}

pub fn recorded_methods(calls: &RecordedCalls) -> Vec<String> {
    calls
        .lock()
        .expect("calls lock")
        .iter()
        .filter_map(|c| c.get("method").and_then(Value::as_str).map(str::to_owned))
        .collect()
}
