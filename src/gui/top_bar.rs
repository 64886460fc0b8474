use eframe::egui::{
    self,
    containers,
};

use super::{
    actions::{
        ActionQueue,
        UiAction,
    },
    theme::Theme,
};
use crate::{
    app::{
        Controller,
        View,
    },
    core::tasks::Operation,
    sync::SyncSnapshot,
};

pub struct TopBar;

impl TopBar {
    pub fn show(
        ctx: &egui::Context,
        controller: &Controller,
        snapshot: &SyncSnapshot,
        theme: &Theme,
        actions: &mut ActionQueue,
    ) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            containers::menu::Bar::new().ui(ui, |ui| {
                egui::widgets::global_theme_preference_switch(ui);

                if controller.view() != View::Dashboard && ui.button("← Back to Sets").clicked() {
                    actions.push(UiAction::BackToDashboard);
                }

                ui.menu_button("Sync", |ui| {
                    if ui.button("Refresh").clicked() {
                        actions.push(UiAction::Dispatch(Operation::Refresh));
                    }
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    Self::show_identity(ui, controller, actions);
                    Self::show_status(ui, snapshot, theme, actions);
                });
            });
        });
    }

    fn show_identity(ui: &mut egui::Ui, controller: &Controller, actions: &mut ActionQueue) {
        if controller.is_signed_in() && ui.small_button("Sign Out").clicked() {
            actions.push(UiAction::SignOut);
        }
        ui.label(controller.identity_label());
    }

    fn show_status(
        ui: &mut egui::Ui,
        snapshot: &SyncSnapshot,
        theme: &Theme,
        actions: &mut ActionQueue,
    ) {
        ui.add_space(8.0);
        match &snapshot.error {
            Some(error) => {
                if ui.small_button("✖").on_hover_text("Dismiss").clicked() {
                    actions.push(UiAction::ClearError);
                }
                ui.small(egui::RichText::new(error).color(theme.danger(ui.ctx())))
                    .on_hover_text("Last sync error");
            }
            None if snapshot.loading => {
                ui.add(egui::Spinner::new().size(12.0));
            }
            None => {
                ui.small(egui::RichText::new("●").color(theme.success(ui.ctx())))
                    .on_hover_text("In sync");
            }
        }
    }
}
