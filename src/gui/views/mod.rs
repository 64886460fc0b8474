pub mod dashboard;
pub mod flashcards;
pub mod learn;
pub mod manage;
pub mod test;

use eframe::egui;

use super::theme::Theme;

const CONTENT_WIDTH: f32 = 720.0;
const CARD_HEIGHT: f32 = 320.0;

/// Title line plus an optional muted subtitle.
pub fn header(ui: &mut egui::Ui, theme: &Theme, title: &str, subtitle: Option<&str>) {
    ui.label(theme.title(title));
    if let Some(subtitle) = subtitle {
        ui.label(theme.subtitle(ui.ctx(), subtitle));
    }
    ui.add_space(16.0);
}

/// Centered message with one call-to-action. True when the button was clicked.
pub fn empty_state(ui: &mut egui::Ui, message: &str, button: &str) -> bool {
    let mut clicked = false;
    panel_frame(ui).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            ui.label(message);
            ui.add_space(12.0);
            clicked = ui.button(button).clicked();
            ui.add_space(24.0);
        });
    });
    clicked
}

pub fn panel_frame(ui: &egui::Ui) -> egui::Frame {
    egui::Frame::new()
        .fill(ui.visuals().extreme_bg_color)
        .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
        .corner_radius(egui::CornerRadius::same(12))
        .inner_margin(egui::Margin::same(20))
}

/// The big clickable card. Shows the term face-up and the definition once
/// flipped. True when clicked.
pub fn flip_card(ui: &mut egui::Ui, theme: &Theme, term: &str, definition: &str, flipped: bool) -> bool {
    let ctx = ui.ctx().clone();
    let (fill, text, color) = if flipped {
        (theme.card_back(&ctx), definition, egui::Color32::WHITE)
    } else {
        (theme.card_front(&ctx), term, ui.visuals().strong_text_color())
    };

    let response = egui::Frame::new()
        .fill(fill)
        .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
        .corner_radius(egui::CornerRadius::same(16))
        .inner_margin(egui::Margin::same(24))
        .show(ui, |ui| {
            ui.set_min_size(egui::vec2(ui.available_width(), CARD_HEIGHT));
            ui.centered_and_justified(|ui| {
                let size = if flipped { 24.0 } else { 30.0 };
                ui.label(egui::RichText::new(text).size(size).color(color));
            });
        })
        .response
        .interact(egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand);

    ui.add_space(24.0);
    response.clicked()
}

/// Narrow centered column the study screens are laid out in.
pub fn content_column<R>(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui) -> R) -> R {
    let width = ui.available_width().min(CONTENT_WIDTH);
    let margin = ((ui.available_width() - width) / 2.0).max(0.0);
    ui.horizontal_top(|ui| {
        ui.add_space(margin);
        ui.vertical(|ui| {
            ui.set_width(width);
            add_contents(ui)
        })
        .inner
    })
    .inner
}
