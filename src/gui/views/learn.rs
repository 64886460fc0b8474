use eframe::egui;

use super::{
    empty_state,
    flip_card,
    header,
    panel_frame,
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
    let session = &controller.learn;
    header(ui, theme, &View::Learn.title(&set.name), Some(session.subtitle(set).as_str()));

    ui.add(
        egui::ProgressBar::new(session.progress(set) / 100.0)
            .fill(theme.success(ui.ctx()))
            .desired_height(12.0),
    );
    ui.add_space(16.0);

    if set.cards.is_empty() {
        if empty_state(ui, "No cards in this set yet!", "Add Cards") {
            actions.push(UiAction::Open { set_id: set.id.clone(), view: View::Manage });
        }
        return;
    }

    let Some(card) = session.current(set) else {
        panel_frame(ui).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("🏆").size(56.0).color(theme.trophy(ui.ctx())));
                ui.label(egui::RichText::new("Congratulations!").size(22.0).strong());
                ui.label("You've mastered all cards in this set!");
                ui.add_space(12.0);
                if ui.button("Start Over").clicked() {
                    actions.push(UiAction::StartOver);
                }
            });
        });
        return;
    };

    if flip_card(ui, theme, &card.term, &card.definition, session.is_flipped()) {
        actions.push(UiAction::Flip);
    }

    ui.vertical_centered(|ui| {
        ui.horizontal(|ui| {
            let still = egui::RichText::new("✖ Still Learning").color(theme.danger(ui.ctx()));
            if ui.button(still).clicked() {
                actions.push(UiAction::StillLearning);
            }
            let got = egui::RichText::new("✔ Got It!").color(theme.success(ui.ctx()));
            if ui.button(got).clicked() {
                actions.push(UiAction::GotIt);
            }
        });
    });
}
