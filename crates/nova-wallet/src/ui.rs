//! UI helper components

use eframe::egui;

pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 212, 170);
const ACCENT_FILL: egui::Color32 = egui::Color32::from_rgb(0, 180, 150);
const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 80, 80);
const SUCCESS_COLOR: egui::Color32 = egui::Color32::from_rgb(80, 200, 120);
pub const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 180, 50);

/// Open URL in a new browser tab
#[cfg(target_arch = "wasm32")]
pub fn open_url_new_tab(url: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.open_with_url_and_target(url, "_blank");
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn open_url_new_tab(url: &str) {
    if let Err(e) = open::that(url) {
        tracing::warn!(url, error = %e, "failed to open browser");
    }
}

/// Copy to clipboard (platform-specific)
#[cfg(not(target_arch = "wasm32"))]
pub fn copy_to_clipboard(text: &str) {
    if let Ok(mut clipboard) = arboard::Clipboard::new() {
        let _ = clipboard.set_text(text);
    }
}

#[cfg(target_arch = "wasm32")]
pub fn copy_to_clipboard(text: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.navigator().clipboard().write_text(text);
    }
}

/// Styled heading with accent color
pub fn styled_heading(ui: &mut egui::Ui, text: &str) {
    ui.heading(egui::RichText::new(text).color(ACCENT));
}

/// Field label above an input
pub fn field_label(ui: &mut egui::Ui, text: &str) {
    ui.label(egui::RichText::new(text).strong());
    ui.add_space(2.0);
}

/// Recipient address input
pub fn address_input(ui: &mut egui::Ui, value: &mut String, enabled: bool) -> egui::Response {
    ui.add_enabled(
        enabled,
        egui::TextEdit::singleline(value)
            .hint_text("0x...")
            .desired_width(f32::INFINITY)
            .font(egui::TextStyle::Monospace),
    )
}

/// Decimal amount input
pub fn amount_input(ui: &mut egui::Ui, value: &mut String, enabled: bool) -> egui::Response {
    ui.add_enabled(
        enabled,
        egui::TextEdit::singleline(value)
            .hint_text("0.0")
            .desired_width(180.0)
            .font(egui::TextStyle::Monospace),
    )
}

/// Spinner with a short status text
pub fn loading_spinner(ui: &mut egui::Ui, text: &str) {
    ui.horizontal(|ui| {
        ui.spinner();
        ui.label(text);
    });
}

pub fn error_message(ui: &mut egui::Ui, message: &str) {
    ui.horizontal_wrapped(|ui| {
        ui.label(egui::RichText::new("❌").size(16.0));
        ui.label(egui::RichText::new(message).color(ERROR_COLOR));
    });
}

pub fn success_message(ui: &mut egui::Ui, message: &str) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("✅").size(16.0));
        ui.label(
            egui::RichText::new(message)
                .color(SUCCESS_COLOR)
                .strong(),
        );
    });
}

pub fn warning_message(ui: &mut egui::Ui, message: &str) {
    ui.horizontal_wrapped(|ui| {
        ui.label(egui::RichText::new("⚠️").size(14.0));
        ui.label(egui::RichText::new(message).color(WARNING_COLOR));
    });
}

/// Small pill next to a value, e.g. "Updated"
pub fn badge(ui: &mut egui::Ui, text: &str) {
    egui::Frame::none()
        .fill(SUCCESS_COLOR.linear_multiply(0.25))
        .rounding(8.0)
        .inner_margin(egui::Margin::symmetric(6.0, 1.0))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(text).small().color(SUCCESS_COLOR));
        });
}

/// Monospace value with a copy button
pub fn copyable_value(ui: &mut egui::Ui, value: &str) {
    ui.horizontal_wrapped(|ui| {
        ui.label(egui::RichText::new(value).monospace());
        if ui
            .small_button("📋")
            .on_hover_text("Copy to clipboard")
            .clicked()
        {
            copy_to_clipboard(value);
        }
    });
}

// =============================================================================
// STYLED BUTTONS
// =============================================================================

/// Primary action button - teal/accent colored, prominent
pub fn primary_button(ui: &mut egui::Ui, text: &str, enabled: bool) -> egui::Response {
    let btn = egui::Button::new(egui::RichText::new(text).size(14.0).color(egui::Color32::WHITE))
        .min_size(egui::vec2(160.0, 34.0))
        .fill(ACCENT_FILL);
    ui.add_enabled(enabled, btn)
}

/// Secondary action button - subdued, outline style
pub fn secondary_button(ui: &mut egui::Ui, text: &str) -> egui::Response {
    let btn = egui::Button::new(egui::RichText::new(text).size(14.0))
        .min_size(egui::vec2(90.0, 30.0));
    ui.add(btn)
}

// =============================================================================
// VISUAL GROUPING
// =============================================================================

/// Render content in a subtle card/frame
pub fn card(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(ui.visuals().faint_bg_color)
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, add_contents);
}

/// Card tinted with a status color (success / error panels)
pub fn status_card(
    ui: &mut egui::Ui,
    tint: egui::Color32,
    add_contents: impl FnOnce(&mut egui::Ui),
) {
    egui::Frame::none()
        .fill(tint.linear_multiply(0.12))
        .stroke(egui::Stroke::new(1.0, tint.linear_multiply(0.6)))
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, add_contents);
}

pub fn success_tint() -> egui::Color32 {
    SUCCESS_COLOR
}

pub fn error_tint() -> egui::Color32 {
    ERROR_COLOR
}
