use eframe::egui;
use egui_extras::{
    Column,
    TableBuilder,
};

use super::{
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
    controller: &mut Controller,
    set: &VocabSet,
    theme: &Theme,
    actions: &mut ActionQueue,
) {
    rename_row(ui, controller, set, theme, actions);
    add_card_form(ui, controller, actions);
    ui.add_space(16.0);
    card_table(ui, set, theme, actions);
}

fn rename_row(
    ui: &mut egui::Ui,
    controller: &mut Controller,
    set: &VocabSet,
    theme: &Theme,
    actions: &mut ActionQueue,
) {
    if !controller.rename_form.is_editing() {
        ui.horizontal(|ui| {
            ui.label(theme.title(&View::Manage.title(&set.name)));
            if ui.small_button("✏").on_hover_text("Rename set").clicked() {
                actions.push(UiAction::BeginRename);
            }
        });
        ui.label(theme.subtitle(ui.ctx(), &format!("{} cards", set.cards.len())));
        ui.add_space(16.0);
        return;
    }

    ui.horizontal(|ui| {
        let input = ui.add(egui::TextEdit::singleline(&mut controller.rename_form.name).desired_width(320.0));
        if input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            actions.push(UiAction::SubmitRename);
        }
        if ui.button("Save").clicked() {
            actions.push(UiAction::SubmitRename);
        }
        if ui.button("Cancel").clicked() {
            actions.push(UiAction::CancelRename);
        }
    });
    ui.add_space(16.0);
}

fn add_card_form(ui: &mut egui::Ui, controller: &mut Controller, actions: &mut ActionQueue) {
    panel_frame(ui).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(egui::RichText::new("Add New Card").size(18.0).strong());
        ui.add_space(8.0);

        let form = &mut controller.card_form;
        let busy = form.is_busy();
        ui.add_enabled_ui(!busy, |ui| {
            ui.add(
                egui::TextEdit::singleline(&mut form.term)
                    .hint_text("Term")
                    .desired_width(f32::INFINITY),
            );
            ui.add(
                egui::TextEdit::multiline(&mut form.definition)
                    .hint_text("Definition")
                    .desired_rows(2)
                    .desired_width(f32::INFINITY),
            );
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let add = ui.add_enabled(form.can_submit(), egui::Button::new("＋ Add Card"));
            if add.clicked() {
                actions.push(UiAction::SubmitCard);
            }
            if busy {
                ui.spinner();
            }
        });
    });
}

fn card_table(ui: &mut egui::Ui, set: &VocabSet, theme: &Theme, actions: &mut ActionQueue) {
    if set.cards.is_empty() {
        ui.label(theme.subtitle(ui.ctx(), "No cards yet. Add your first card above!"));
        return;
    }

    let danger = theme.danger(ui.ctx());
    TableBuilder::new(ui)
        .striped(true)
        .resizable(false)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::remainder().at_least(120.0))
        .column(Column::remainder().at_least(160.0))
        .column(Column::exact(40.0))
        .header(25.0, |mut header| {
            header.col(|ui| {
                ui.strong("Term");
            });
            header.col(|ui| {
                ui.strong("Definition");
            });
            header.col(|_| {});
        })
        .body(|mut body| {
            for card in &set.cards {
                body.row(30.0, |mut row| {
                    row.col(|ui| {
                        ui.label(&card.term);
                    });
                    row.col(|ui| {
                        ui.label(&card.definition);
                    });
                    row.col(|ui| {
                        let delete = ui
                            .small_button(egui::RichText::new("🗑").color(danger))
                            .on_hover_text("Delete card");
                        if delete.clicked() {
                            actions.push(UiAction::RequestDeleteCard { card_id: card.id.clone() });
                        }
                    });
                });
            }
        });
}
