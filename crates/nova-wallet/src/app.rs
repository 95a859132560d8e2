//! Main application state and update loop

use eframe::egui;
use nova_wallet_adapters::WalletAdapterConfig;
use nova_wallet_core::{resolve_chain, ChainSelector};

use crate::bridge::{ConnectState, WalletBridge};
use crate::chain_switcher;
use crate::transfer_form::{self, TransferFormAction};
use crate::ui;
use crate::wallet_info::{self, WalletInfoAction};

const INSTALL_HINT: &str = "MetaMask is not installed. Please install MetaMask to use this app.";

/// The main application state
pub struct App {
    wallet: WalletBridge,
    chain_selector: ChainSelector,
    /// Connection state seen on the previous frame
    was_connected: bool,
}

impl App {
    /// Create a new App instance
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = WalletAdapterConfig::from_env();
        tracing::debug!(?config, "wallet adapter config");
        let wallet = WalletBridge::new(cc.egui_ctx.clone(), config);
        wallet.restore();

        Self {
            wallet,
            chain_selector: ChainSelector::default(),
            was_connected: false,
        }
    }

    fn render_connect(&mut self, ui: &mut egui::Ui) {
        ui::card(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.add_space(8.0);
                ui.label("Connect your wallet to send native currency on any supported network.");
                ui.add_space(12.0);

                if !self.wallet.provider_available() {
                    ui::primary_button(ui, "🔌 Connect Wallet", false);
                    ui.add_space(8.0);
                    ui::warning_message(ui, INSTALL_HINT);
                    return;
                }

                match self.wallet.connect_state() {
                    ConnectState::Connecting => ui::loading_spinner(ui, "Waiting for wallet..."),
                    state => {
                        if ui::primary_button(ui, "🔌 Connect Wallet", true).clicked() {
                            self.wallet.connect();
                        }
                        if let ConnectState::Failed(message) = state {
                            ui.add_space(8.0);
                            ui::error_message(ui, &message);
                        }
                    }
                }
                ui.add_space(8.0);
            });
        });
    }

    fn render_connected(&mut self, ui: &mut egui::Ui) {
        let session = self.wallet.session();

        if let Some(target) = chain_switcher::render(ui, &mut self.chain_selector, session.chain_id) {
            self.wallet.switch_chain(target);
        }
        ui.add_space(10.0);

        if let WalletInfoAction::RefreshBalance = wallet_info::render(ui, &session) {
            self.wallet.refresh_balance();
        }
        ui.add_space(14.0);

        let form = self.wallet.form();
        ui::card(ui, |ui| {
            ui.set_min_width(ui.available_width());
            match transfer_form::render(ui, &form, session.chain_id) {
                TransferFormAction::None => {}
                TransferFormAction::RecipientChanged(value) => self.wallet.set_recipient(value),
                TransferFormAction::AmountChanged(value) => self.wallet.set_amount(value),
                TransferFormAction::Submit => self.wallet.submit_transfer(),
                TransferFormAction::Reset => self.wallet.reset_form(),
            }
        });
        ui.add_space(14.0);

        if ui::secondary_button(ui, "Disconnect Wallet").clicked() {
            self.chain_selector.close();
            self.wallet.disconnect();
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        self.wallet.poll_provider_events();

        let session = self.wallet.session();
        if self.was_connected && !session.is_connected {
            // The wallet dropped the account; stale input must not carry over.
            self.wallet.reset_form();
            self.chain_selector.close();
        }
        self.was_connected = session.is_connected;

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(
                    egui::RichText::new("💸 Nova Wallet")
                        .size(22.0)
                        .color(ui::ACCENT),
                );
                ui.add_space(20.0);
                ui.separator();
                ui.add_space(10.0);
                let chain = resolve_chain(session.chain_id);
                ui.label(
                    egui::RichText::new(format!("{} {}", chain.icon, chain.display_name)).strong(),
                );
            });
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(format!(
                        "v{} · {} · built {}",
                        env!("CARGO_PKG_VERSION"),
                        short_git_hash(),
                        env!("BUILD_TIME"),
                    ))
                    .small()
                    .weak(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(format!("provider: {}", self.wallet.provider_mode()))
                            .small()
                            .weak(),
                    );
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                ui::styled_heading(ui, "Send Crypto");
                ui.add_space(10.0);
                if session.is_connected {
                    self.render_connected(ui);
                } else {
                    self.render_connect(ui);
                }
                ui.add_space(20.0);
            });
        });
    }
}

fn short_git_hash() -> &'static str {
    let hash = env!("GIT_HASH");
    hash.get(..8).unwrap_or(hash)
}
