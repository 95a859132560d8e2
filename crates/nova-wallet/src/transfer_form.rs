//! Recipient/amount form with its success and error panels

use eframe::egui;
use nova_wallet_core::chains::explorer_tx_url;
use nova_wallet_core::{TransferForm, TransferOutcome};

use crate::ui;

pub enum TransferFormAction {
    None,
    RecipientChanged(String),
    AmountChanged(String),
    Submit,
    Reset,
}

pub fn render(ui: &mut egui::Ui, form: &TransferForm, chain_id: u64) -> TransferFormAction {
    let mut action = TransferFormAction::None;
    let pending = form.is_pending();

    ui::field_label(ui, "Recipient Address");
    let mut recipient = form.request.recipient.clone();
    if ui::address_input(ui, &mut recipient, !pending).changed() {
        action = TransferFormAction::RecipientChanged(recipient);
    }
    ui.add_space(8.0);

    ui::field_label(ui, "Amount (ETH)");
    let mut amount = form.request.amount.clone();
    if ui::amount_input(ui, &mut amount, !pending).changed() {
        action = TransferFormAction::AmountChanged(amount);
    }
    ui.add_space(12.0);

    if pending {
        ui::loading_spinner(ui, "Sending...");
    } else if ui::primary_button(ui, "📤 Send Transaction", form.can_submit()).clicked() {
        action = TransferFormAction::Submit;
    }

    match &form.outcome {
        Some(TransferOutcome::Success { transaction_hash }) => {
            let hash = transaction_hash.to_string();
            ui.add_space(12.0);
            ui::status_card(ui, ui::success_tint(), |ui| {
                ui::success_message(ui, "Transaction sent!");
                ui.label(egui::RichText::new("Transaction Hash:").weak());
                ui::copyable_value(ui, &hash);
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if let Some(url) = explorer_tx_url(chain_id, &hash) {
                        if ui.link("View on Block Explorer →").clicked() {
                            ui::open_url_new_tab(&url);
                        }
                        ui.add_space(12.0);
                    }
                    if ui::secondary_button(ui, "Start another transfer").clicked() {
                        action = TransferFormAction::Reset;
                    }
                });
            });
        }
        Some(TransferOutcome::Failure { message }) => {
            ui.add_space(12.0);
            ui::status_card(ui, ui::error_tint(), |ui| {
                ui::error_message(ui, message);
            });
        }
        Some(TransferOutcome::Pending) | None => {}
    }

    action
}
