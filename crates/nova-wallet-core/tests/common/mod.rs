#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use nova_wallet_core::{PortError, ProviderEvent, ProviderPort, RefreshScheduler};

pub const ONE_ETHER_HEX: &str = "0xde0b6b3a7640000";
pub const TX_HASH: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";

/// Scripted provider: answers per method, records every call.
///
/// The last scripted answer for a method is reused once the queue runs dry.
#[derive(Debug, Clone)]
pub struct MockProvider {
    available: bool,
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<Value, PortError>>>>>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    events: Arc<Mutex<Vec<ProviderEvent>>>,
    gated_method: Option<String>,
    gate: Arc<Notify>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            available: true,
            responses: Arc::default(),
            calls: Arc::default(),
            events: Arc::default(),
            gated_method: None,
            gate: Arc::new(Notify::new()),
        }
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    pub fn respond(self, method: &str, result: Result<Value, PortError>) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .entry(method.to_owned())
            .or_default()
            .push_back(result);
        self
    }

    /// Calls to `method` wait for [`Self::release`].
    pub fn gate(mut self, method: &str) -> Self {
        self.gated_method = Some(method.to_owned());
        self
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn push_event(&self, event: ProviderEvent) {
        self.events.lock().expect("events lock").push(event);
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params)
            .collect()
    }
}

#[async_trait(?Send)]
impl ProviderPort for MockProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((method.to_owned(), params));

        if self.gated_method.as_deref() == Some(method) {
            self.gate.notified().await;
        }

        let mut responses = self.responses.lock().expect("responses lock");
        let queue = responses
            .get_mut(method)
            .ok_or_else(|| PortError::NotFound(format!("no scripted response for {method}")))?;
        match queue.len() {
            0 => Err(PortError::NotFound(format!("no scripted response for {method}"))),
            1 => queue.front().cloned().expect("one response"),
            _ => queue.pop_front().expect("queued response"),
        }
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, PortError> {
        Ok(std::mem::take(&mut *self.events.lock().expect("events lock")))
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

#[derive(Debug, Default)]
pub struct RecordingScheduler {
    stale_marks: Mutex<u32>,
    delays: Mutex<Vec<Duration>>,
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

pub fn account_a() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("account a")
}

pub fn account_b() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("account b")
}

pub fn recipient() -> String {
    "0x000000000000000000000000000000000000CAFE".to_owned()
}
