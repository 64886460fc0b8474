use eframe::egui;

use super::{
    header,
    panel_frame,
};
use crate::{
    app::{
        Controller,
        View,
    },
    gui::{
        actions::{
            ActionQueue,
            UiAction,
        },
        theme::Theme,
    },
    sync::SyncSnapshot,
};

const TILE_WIDTH: f32 = 300.0;

pub fn show(
    ui: &mut egui::Ui,
    controller: &mut Controller,
    snapshot: &SyncSnapshot,
    theme: &Theme,
    actions: &mut ActionQueue,
) {
    ui.horizontal(|ui| {
        header(ui, theme, "VocabLearn", None);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
            if ui.button("＋ New Set").clicked() {
                actions.push(UiAction::BeginNewSet);
            }
        });
    });

    if snapshot.sets.is_empty() {
        ui.label(theme.subtitle(ui.ctx(), "No sets yet. Create one to get started."));
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(16.0, 16.0);
            for set in &snapshot.sets {
                panel_frame(ui).show(ui, |ui| {
                    ui.set_width(TILE_WIDTH);
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(&set.name).size(20.0).strong());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            let delete = ui
                                .small_button(egui::RichText::new("🗑").color(theme.danger(ui.ctx())))
                                .on_hover_text("Delete set");
                            if delete.clicked() {
                                actions.push(UiAction::RequestDeleteSet { set_id: set.id.clone() });
                            }
                        });
                    });
                    ui.label(theme.subtitle(ui.ctx(), &set.card_count_label()));
                    ui.add_space(12.0);

                    ui.horizontal(|ui| {
                        for (label, view) in [
                            ("Flashcards", View::Flashcards),
                            ("Learn", View::Learn),
                            ("Test", View::Test),
                            ("✏ Edit", View::Manage),
                        ] {
                            if ui.button(label).clicked() {
                                actions.push(UiAction::Open { set_id: set.id.clone(), view });
                            }
                        }
                    });
                });
            }
        });
    });

    new_set_dialog(ui.ctx(), controller, actions);
}

fn new_set_dialog(ctx: &egui::Context, controller: &mut Controller, actions: &mut ActionQueue) {
    let Some(name) = controller.new_set_name.as_mut() else {
        return;
    };

    let mut submit = false;
    let mut cancel = false;
    let modal = egui::Modal::new(egui::Id::new("new_set_modal")).show(ctx, |ui| {
        ui.set_width(360.0);
        ui.label(egui::RichText::new("Enter set name:").size(16.0));
        ui.add_space(8.0);

        let input = ui.add(egui::TextEdit::singleline(name).hint_text("e.g. Spanish verbs"));
        input.request_focus();
        if input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submit = true;
        }

        ui.add_space(12.0);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Create").clicked() {
                submit = true;
            }
            if ui.button("Cancel").clicked() {
                cancel = true;
            }
        });
    });

    if submit {
        if let Some(operation) = controller.submit_new_set() {
            actions.push(UiAction::Dispatch(operation));
        }
    } else if cancel || modal.should_close() {
        controller.cancel_new_set();
    }
}
