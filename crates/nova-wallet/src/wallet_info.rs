//! Connected account card: address, balance and refresh

use eframe::egui;
use nova_wallet_core::chains::explorer_address_url;
use nova_wallet_core::WalletSession;

use crate::ui;

pub enum WalletInfoAction {
    None,
    RefreshBalance,
}

pub fn render(ui: &mut egui::Ui, session: &WalletSession) -> WalletInfoAction {
    let mut action = WalletInfoAction::None;
    let address = session.address_hex();

    ui::card(ui, |ui| {
        ui.set_min_width(ui.available_width());
        ui.label(egui::RichText::new("Connected Address").weak());
        ui.horizontal_wrapped(|ui| {
            match explorer_address_url(session.chain_id, &address) {
                Some(url) => {
                    if ui
                        .link(egui::RichText::new(&address).monospace())
                        .on_hover_text("Open in block explorer")
                        .clicked()
                    {
                        ui::open_url_new_tab(&url);
                    }
                }
                None => {
                    ui.label(egui::RichText::new(&address).monospace());
                }
            }
            if ui
                .small_button("📋")
                .on_hover_text("Copy to clipboard")
                .clicked()
            {
                ui::copy_to_clipboard(&address);
            }
        });

        ui.add_space(8.0);
        ui.label(egui::RichText::new("Balance").weak());
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(format!("{} ETH", session.balance))
                    .size(20.0)
                    .strong(),
            );
            if session.balance_updated {
                ui::badge(ui, "Updated");
            }
            if session.is_loading_balance {
                ui.spinner();
            } else if ui
                .small_button("🔄")
                .on_hover_text("Refresh balance")
                .clicked()
            {
                action = WalletInfoAction::RefreshBalance;
            }
        });
    });

    action
}
