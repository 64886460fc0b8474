use eframe::egui;

use super::{
    empty_state,
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
    study::{
        Score,
        TestSession,
    },
};

pub fn show(
    ui: &mut egui::Ui,
    controller: &Controller,
    set: &VocabSet,
    theme: &Theme,
    actions: &mut ActionQueue,
) {
    let title = View::Test.title(&set.name);

    let session = match &controller.test {
        Some(Ok(session)) => session,
        Some(Err(not_enough)) => {
            header(ui, theme, &title, None);
            if empty_state(ui, &not_enough.to_string(), "Add More Cards") {
                actions.push(UiAction::Open { set_id: set.id.clone(), view: View::Manage });
            }
            return;
        }
        None => {
            header(ui, theme, &title, None);
            return;
        }
    };

    match session.score() {
        Some(score) => {
            header(ui, theme, &title, None);
            results(ui, theme, score, actions);
        }
        None => {
            header(ui, theme, &title, Some(session.subtitle().as_str()));
            questions(ui, session, actions);
        }
    }
}

fn questions(ui: &mut egui::Ui, session: &TestSession, actions: &mut ActionQueue) {
    egui::ScrollArea::vertical().show(ui, |ui| {
        for (index, question) in session.questions().iter().enumerate() {
            panel_frame(ui).show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(egui::RichText::new(question.prompt(index + 1)).size(18.0).strong());
                ui.add_space(8.0);

                let selected = session.selected(&question.card.id);
                for option in &question.options {
                    if ui.radio(selected == Some(option.as_str()), option.as_str()).clicked() {
                        actions.push(UiAction::Answer {
                            card_id: question.card.id.clone(),
                            option: option.clone(),
                        });
                    }
                }
            });
            ui.add_space(12.0);
        }

        ui.vertical_centered(|ui| {
            let submit = ui.add_enabled(session.can_submit(), egui::Button::new("Submit Test"));
            if submit.clicked() {
                actions.push(UiAction::SubmitTest);
            }
        });
    });
}

fn results(ui: &mut egui::Ui, theme: &Theme, score: Score, actions: &mut ActionQueue) {
    panel_frame(ui).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.vertical_centered(|ui| {
            let (icon, color) = if score.passed() {
                ("🏆", theme.trophy(ui.ctx()))
            } else {
                ("📈", theme.accent(ui.ctx()))
            };
            ui.label(egui::RichText::new(icon).size(56.0).color(color));
            ui.label(egui::RichText::new(format!("{}%", score.percentage)).size(32.0).strong());
            ui.label(egui::RichText::new(score.summary()).size(18.0));
            ui.add_space(16.0);

            ui.horizontal(|ui| {
                if ui.button("Retake Test").clicked() {
                    actions.push(UiAction::RetakeTest);
                }
                if ui.button("Back to Sets").clicked() {
                    actions.push(UiAction::BackToDashboard);
                }
            });
        });
    });
}
