//! Network dropdown shown above the wallet card

use eframe::egui;
use nova_wallet_core::{resolve_chain, supported_chains, ChainSelector};

/// Renders the dropdown. Returns the chain the user picked, if any; the
/// caller forwards it to the wallet.
pub fn render(ui: &mut egui::Ui, selector: &mut ChainSelector, current_chain_id: u64) -> Option<u64> {
    let current = resolve_chain(current_chain_id);
    let mut picked = None;

    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Network:").strong());
        let arrow = if selector.is_open() { "▴" } else { "▾" };
        let button = ui.button(format!("{} {} {}", current.icon, current.display_name, arrow));
        if button.clicked() {
            selector.toggle();
        }

        if !selector.is_open() {
            return;
        }

        let popup_id = ui.make_persistent_id("chain_switcher_popup");
        let area = egui::Area::new(popup_id)
            .order(egui::Order::Foreground)
            .fixed_pos(button.rect.left_bottom())
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_width(button.rect.width().max(200.0));
                    for chain in supported_chains() {
                        let is_current = chain.id == current_chain_id;
                        let text = if is_current {
                            format!("{} {}  ✓", chain.icon, chain.display_name)
                        } else {
                            format!("{} {}", chain.icon, chain.display_name)
                        };
                        if ui.selectable_label(is_current, text).clicked() {
                            picked = Some(selector.select(chain.id));
                        }
                    }
                });
            });

        // Close on a click outside both the button and the list.
        let clicked_elsewhere = ui.input(|i| i.pointer.any_click())
            && !area.response.hovered()
            && !button.hovered();
        if clicked_elsewhere || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            selector.close();
        }
    });

    picked
}
