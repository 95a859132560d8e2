//! Bridge between the egui shell and the wallet workspace crates.
//! The shell talks to the session store and transfer controller only through here.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use eframe::egui;
use tracing::{debug, warn};

use nova_wallet_adapters::{delay, Eip1193Adapter, WalletAdapterConfig};
use nova_wallet_core::{
    ProviderPort, RefreshScheduler, SessionStore, TransferController, TransferForm, WalletSession,
};

type WalletSessionStore = SessionStore<Eip1193Adapter>;
type WalletTransferController = TransferController<Eip1193Adapter>;

/// Progress of the last connect attempt, for the connect button.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectState {
    #[default]
    Idle,
    Connecting,
    Failed(String),
}

#[derive(Clone)]
pub struct WalletBridge {
    ctx: egui::Context,
    provider: Eip1193Adapter,
    session: WalletSessionStore,
    transfer: WalletTransferController,
    connect_state: Arc<Mutex<ConnectState>>,
    event_poll_interval: Duration,
    /// Set while a wallet re-read is queued or running.
    wallet_sync_pending: Arc<AtomicBool>,
}

impl WalletBridge {
    pub fn new(ctx: egui::Context, config: WalletAdapterConfig) -> Self {
        let provider = Eip1193Adapter::with_config(config.clone());
        Self {
            ctx,
            session: SessionStore::new(provider.clone()),
            transfer: TransferController::new(provider.clone())
                .with_refresh_delay(Duration::from_millis(config.balance_refresh_delay_ms)),
            provider,
            connect_state: Arc::new(Mutex::new(ConnectState::Idle)),
            event_poll_interval: Duration::from_millis(config.event_poll_interval_ms),
            wallet_sync_pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session(&self) -> WalletSession {
        self.session.snapshot()
    }

    pub fn form(&self) -> TransferForm {
        self.transfer.form()
    }

    pub fn provider_available(&self) -> bool {
        self.provider.is_available()
    }

    pub fn provider_mode(&self) -> &'static str {
        self.provider.mode_label()
    }

    pub fn connect_state(&self) -> ConnectState {
        self.connect_state
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    fn set_connect_state(&self, state: ConnectState) {
        if let Ok(mut g) = self.connect_state.lock() {
            *g = state;
        }
    }

    /// Picks up an account the wallet already authorised for this app.
    pub fn restore(&self) {
        let session = self.session.clone();
        let ctx = self.ctx.clone();
        spawn_task(move || async move {
            session.restore().await;
            ctx.request_repaint();
        });
    }

    pub fn connect(&self) {
        if self.connect_state() == ConnectState::Connecting {
            return;
        }
        self.set_connect_state(ConnectState::Connecting);
        let bridge = self.clone();
        spawn_task(move || async move {
            let next = match bridge.session.connect().await {
                Ok(()) => ConnectState::Idle,
                Err(e) => {
                    warn!(error = %e, "wallet connection failed");
                    ConnectState::Failed(
                        e.user_message()
                            .unwrap_or_else(|| "Failed to connect wallet".to_owned()),
                    )
                }
            };
            bridge.set_connect_state(next);
            bridge.ctx.request_repaint();
        });
    }

    /// Local disconnect; the transfer form is cleared with it.
    pub fn disconnect(&self) {
        self.session.disconnect();
        self.transfer.reset();
        self.set_connect_state(ConnectState::Idle);
    }

    pub fn refresh_balance(&self) {
        let session = self.session.clone();
        let ctx = self.ctx.clone();
        spawn_task(move || async move {
            session.refresh_balance().await;
            ctx.request_repaint();
        });
    }

    pub fn switch_chain(&self, target_chain_id: u64) {
        let session = self.session.clone();
        let ctx = self.ctx.clone();
        spawn_task(move || async move {
            session.switch_chain(target_chain_id).await;
            ctx.request_repaint();
        });
    }

    pub fn set_recipient(&self, recipient: impl Into<String>) {
        self.transfer.set_recipient(recipient);
    }

    pub fn set_amount(&self, amount: impl Into<String>) {
        self.transfer.set_amount(amount);
    }

    pub fn reset_form(&self) {
        self.transfer.reset();
    }

    pub fn submit_transfer(&self) {
        let from = self.session.snapshot().address;
        let transfer = self.transfer.clone();
        let scheduler = DeferredBalanceRefresh {
            session: self.session.clone(),
            ctx: self.ctx.clone(),
        };
        spawn_task(move || async move {
            let outcome = transfer.submit(from, &scheduler).await;
            debug!(?outcome, "transfer settled");
            scheduler.ctx.request_repaint();
        });
        self.ctx.request_repaint();
    }

    /// Folds pending wallet events into the session. Call once per frame.
    ///
    /// Wallets without push events are re-read at most once per poll interval.
    pub fn poll_provider_events(&self) {
        if self.provider.polls_wallet() {
            self.queue_wallet_sync();
        }
        if let Some(address) = self.session.poll_provider_events() {
            let session = self.session.clone();
            let ctx = self.ctx.clone();
            spawn_task(move || async move {
                session.fetch_balance(address).await;
                ctx.request_repaint();
            });
        }
        if self.provider.is_available() {
            self.ctx.request_repaint_after(self.event_poll_interval);
        }
    }

    fn queue_wallet_sync(&self) {
        if self
            .wallet_sync_pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let provider = self.provider.clone();
        let pending = Arc::clone(&self.wallet_sync_pending);
        let interval = self.event_poll_interval;
        let ctx = self.ctx.clone();
        spawn_task(move || async move {
            delay::sleep(interval).await;
            if let Err(e) = provider.sync_wallet_view().await {
                debug!(error = %e, "wallet re-read failed");
            }
            pending.store(false, Ordering::Release);
            ctx.request_repaint();
        });
    }
}

/// Runs one balance refresh after the requested delay.
#[derive(Clone)]
struct DeferredBalanceRefresh {
    session: WalletSessionStore,
    ctx: egui::Context,
}

impl RefreshScheduler for DeferredBalanceRefresh {
    fn mark_balance_stale(&self) {
        self.session.mark_balance_stale();
        self.ctx.request_repaint();
    }

    fn schedule_balance_refresh(&self, after: Duration) {
        let session = self.session.clone();
        let ctx = self.ctx.clone();
        spawn_task(move || async move {
            delay::sleep(after).await;
            session.refresh_balance().await;
            ctx.request_repaint();
        });
    }
}

/// Runs a provider future off the UI thread.
///
/// Provider futures are not `Send`, so natively the future is built inside
/// the worker thread from a `Send` closure.
#[cfg(not(target_arch = "wasm32"))]
fn spawn_task<F, Fut>(make: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + 'static,
{
    use eyre::WrapErr;

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .wrap_err("failed to build tokio runtime");
        match runtime {
            Ok(rt) => rt.block_on(make()),
            Err(e) => tracing::error!(error = ?e, "wallet task not started"),
        }
    });
}

#[cfg(target_arch = "wasm32")]
fn spawn_task<F, Fut>(make: F)
where
    F: FnOnce() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(make());
}
