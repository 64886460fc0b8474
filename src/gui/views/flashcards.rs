use eframe::egui;

use super::{
    empty_state,
    flip_card,
    header,
};
use crate::{
    app::{
        Controller,
        View,
    },
    core::VocabSet,
    gui::{
        actions::{
            ActionQueue,
            UiAction,
        },
        theme::Theme,
    },
};

pub fn show(
    ui: &mut egui::Ui,
    controller: &Controller,
    set: &VocabSet,
    theme: &Theme,
    actions: &mut ActionQueue,
) {
    let session = &controller.flashcards;
    header(ui, theme, &View::Flashcards.title(&set.name), session.subtitle(set).as_deref());

    let Some(card) = session.current(set) else {
        if empty_state(ui, "No cards in this set yet!", "Add Cards") {
            actions.push(UiAction::Open { set_id: set.id.clone(), view: View::Manage });
        }
        return;
    };

    if flip_card(ui, theme, &card.term, &card.definition, session.is_flipped()) {
        actions.push(UiAction::Flip);
    }

    ui.vertical_centered(|ui| {
        ui.horizontal(|ui| {
            if ui.button("◀").on_hover_text("Previous").clicked() {
                actions.push(UiAction::Previous);
            }
            if ui.button("⟲ Flip").clicked() {
                actions.push(UiAction::Flip);
            }
            if ui.button("▶").on_hover_text("Next").clicked() {
                actions.push(UiAction::Next);
            }
        });
    });
}
