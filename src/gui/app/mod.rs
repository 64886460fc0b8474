mod modals;

use std::time::{
    Duration,
    Instant,
};

use eframe::egui;
use modals::Modals;
use tracing::{
    debug,
    info,
    warn,
};

use super::{
    actions::{
        ActionQueue,
        UiAction,
    },
    confirm_modal,
    theme::{
        set_theme,
        Theme,
    },
    top_bar::TopBar,
    views,
};
use crate::{
    app::{
        Controller,
        View,
    },
    core::{
        config::save_dark_mode,
        tasks::{
            TaskManager,
            TaskResult,
        },
        Config,
    },
    sync::SyncSnapshot,
};

const TICK_INTERVAL: Duration = Duration::from_millis(50);

pub struct FlashdeckApp {
    controller: Controller,
    task_manager: TaskManager,
    theme: Theme,
    modals: Modals,
    actions: ActionQueue,
    dark_mode: bool,
}

impl FlashdeckApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &Config, task_manager: TaskManager) -> Self {
        let theme = Theme::indigo();
        set_theme(&cc.egui_ctx, &theme);

        cc.egui_ctx.set_theme(if config.dark_mode { egui::Theme::Dark } else { egui::Theme::Light });

        let ctx = cc.egui_ctx.clone();
        task_manager.engine().on_change(move || ctx.request_repaint());

        let controller = Controller::new(config.session.clone());
        task_manager.dispatch(controller.start());

        Self {
            controller,
            task_manager,
            theme,
            modals: Modals::default(),
            actions: ActionQueue::new(),
            dark_mode: config.dark_mode,
        }
    }

    fn remember_theme(&mut self, ctx: &egui::Context) {
        let dark_mode = ctx.style().visuals.dark_mode;
        if dark_mode == self.dark_mode {
            return;
        }
        self.dark_mode = dark_mode;
        if let Err(e) = save_dark_mode(dark_mode) {
            warn!("Failed to save theme preference: {}", e);
        }
    }

    fn handle_task_result(&mut self, result: TaskResult) {
        debug!(task = result.task_type(), ok = result.succeeded(), "task finished");
        let snapshot = self.task_manager.engine().snapshot();
        self.controller.apply(&result, &snapshot);
    }

    fn draw_view(&mut self, ui: &mut egui::Ui, snapshot: &SyncSnapshot) {
        let view = self.controller.view();
        if view == View::Dashboard {
            views::dashboard::show(ui, &mut self.controller, snapshot, &self.theme, &mut self.actions);
            return;
        }

        // `resolve` has already dropped back to the dashboard if the set is gone.
        let Some(set) = self.controller.current_set(snapshot) else {
            return;
        };

        let controller = &mut self.controller;
        let theme = &self.theme;
        let actions = &mut self.actions;
        views::content_column(ui, |ui| match view {
            View::Flashcards => views::flashcards::show(ui, controller, set, theme, actions),
            View::Learn => views::learn::show(ui, controller, set, theme, actions),
            View::Test => views::test::show(ui, controller, set, theme, actions),
            View::Manage => views::manage::show(ui, controller, set, theme, actions),
            View::Dashboard => {}
        });
    }

    fn draw_loading(ui: &mut egui::Ui, theme: &Theme) {
        ui.centered_and_justified(|ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 3.0);
                ui.add(egui::Spinner::new().size(32.0));
                ui.label(theme.subtitle(ui.ctx(), "Loading your sets..."));
            });
        });
    }

    fn show_dialogs(&mut self, ctx: &egui::Context) {
        if let Some(confirm) = self.controller.pending_confirm() {
            match confirm_modal::show(ctx, confirm.message(), self.theme.danger(ctx)) {
                Some(true) => {
                    if let Some(operation) = self.controller.confirm() {
                        self.actions.push(UiAction::Dispatch(operation));
                    }
                }
                Some(false) => self.controller.cancel_confirm(),
                None => {}
            }
        }

        if let Some(notice) = self.controller.notice() {
            if !self.modals.error.is_open() {
                self.modals.error.show_error("Can't do that", notice, None::<String>);
            }
        }
        if self.modals.error.show(ctx) {
            self.controller.dismiss_notice();
        }
    }

    fn apply_actions(&mut self, snapshot: &SyncSnapshot) {
        let now = Instant::now();
        let actions: Vec<UiAction> = self.actions.drain().collect();

        for action in actions {
            match action {
                UiAction::Open { set_id, view } => match snapshot.find_set(&set_id) {
                    Some(set) => self.controller.open(set, view),
                    None => warn!(set_id = %set_id, "tried to open a set that is not loaded"),
                },
                UiAction::BackToDashboard => self.controller.back_to_dashboard(),
                UiAction::Dispatch(operation) => self.task_manager.dispatch(operation),
                UiAction::ClearError => self.task_manager.engine().clear_error(),
                UiAction::BeginNewSet => self.controller.begin_new_set(),
                UiAction::RequestDeleteSet { set_id } => {
                    self.controller.request_delete_set(&set_id, snapshot.sets.len())
                }
                UiAction::Flip => match self.controller.view() {
                    View::Learn => self.controller.learn.flip(),
                    _ => self.controller.flashcards.flip(),
                },
                UiAction::Next => {
                    if let Some(set) = self.controller.current_set(snapshot) {
                        self.controller.flashcards.next(set, now);
                    }
                }
                UiAction::Previous => {
                    if let Some(set) = self.controller.current_set(snapshot) {
                        self.controller.flashcards.previous(set, now);
                    }
                }
                UiAction::StillLearning => {
                    if let Some(set) = self.controller.current_set(snapshot) {
                        self.controller.learn.still_learning(set, now);
                    }
                }
                UiAction::GotIt => {
                    if let Some(set) = self.controller.current_set(snapshot) {
                        self.controller.learn.got_it(set, now);
                    }
                }
                UiAction::StartOver => self.controller.learn.reset(),
                UiAction::Answer { card_id, option } => {
                    if let Some(Ok(test)) = self.controller.test.as_mut() {
                        test.answer(&card_id, &option);
                    }
                }
                UiAction::SubmitTest => {
                    if let Some(Ok(test)) = self.controller.test.as_mut() {
                        if let Some(score) = test.submit() {
                            info!(correct = score.correct, total = score.total, "test submitted");
                        }
                    }
                }
                UiAction::RetakeTest => {
                    if let Some(Ok(test)) = self.controller.test.as_mut() {
                        test.retake();
                    }
                }
                UiAction::SubmitCard => {
                    if let Some(operation) = self.controller.submit_card() {
                        self.task_manager.dispatch(operation);
                    }
                }
                UiAction::BeginRename => {
                    if let Some(set) = self.controller.current_set(snapshot) {
                        let name = set.name.clone();
                        self.controller.rename_form.begin(&name);
                    }
                }
                UiAction::SubmitRename => {
                    if let Some(operation) = self.controller.submit_rename(snapshot) {
                        self.task_manager.dispatch(operation);
                    }
                }
                UiAction::CancelRename => self.controller.rename_form.cancel(),
                UiAction::RequestDeleteCard { card_id } => self.controller.request_delete_card(&card_id),
                UiAction::SignOut => {
                    let operation = self.controller.sign_out();
                    self.task_manager.dispatch(operation);
                }
            }
        }
    }
}

impl eframe::App for FlashdeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for result in self.task_manager.poll_results() {
            self.handle_task_result(result);
        }

        let snapshot = self.task_manager.engine().snapshot();
        self.controller.resolve(&snapshot);

        self.controller.tick(Instant::now());
        if self.controller.flashcards.is_moving() || self.controller.learn.is_moving() {
            ctx.request_repaint_after(TICK_INTERVAL);
        }

        TopBar::show(ctx, &self.controller, &snapshot, &self.theme, &mut self.actions);

        egui::CentralPanel::default().show(ctx, |ui| {
            if snapshot.loading && snapshot.sets.is_empty() {
                Self::draw_loading(ui, &self.theme);
            } else {
                self.draw_view(ui, &snapshot);
            }
        });

        self.show_dialogs(ctx);
        self.apply_actions(&snapshot);
        self.remember_theme(ctx);
    }
}
