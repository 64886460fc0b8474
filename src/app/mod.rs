//! Screen routing and the navigation rules applied after each sync result.
//!
//! The controller only remembers which set is open, never a copy of it. The
//! open set is looked up in the engine snapshot on every frame, so renames
//! and card changes show up without extra bookkeeping.

use std::time::Instant;

use rand::Rng;
use tracing::debug;

use crate::{
    core::{
        tasks::{
            Operation,
            TaskResult,
        },
        Session,
        VocabSet,
    },
    study::{
        can_delete_set,
        validate_set_name,
        CardForm,
        FlashcardSession,
        LearnSession,
        NotEnoughCards,
        RenameForm,
        TestSession,
    },
    sync::SyncSnapshot,
};

pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    Flashcards,
    Learn,
    Test,
    Manage,
}

impl View {
    pub fn needs_set(&self) -> bool {
        !matches!(self, View::Dashboard)
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Dashboard => "Sets",
            View::Flashcards => "Flashcards",
            View::Learn => "Learn",
            View::Test => "Test",
            View::Manage => "Manage",
        }
    }

    /// Screen title for `set_name`.
    pub fn title(&self, set_name: &str) -> String {
        match self {
            View::Dashboard => "VocabLearn".to_string(),
            View::Flashcards => set_name.to_string(),
            View::Learn => format!("Learn: {}", set_name),
            View::Test => format!("Test: {}", set_name),
            View::Manage => format!("Manage: {}", set_name),
        }
    }
}

/// Destructive action waiting for the user to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    DeleteSet { set_id: String },
    DeleteCard { set_id: String, card_id: String },
}

impl Confirm {
    pub fn message(&self) -> &'static str {
        match self {
            Confirm::DeleteSet { .. } => "Are you sure you want to delete this set?",
            Confirm::DeleteCard { .. } => "Are you sure you want to delete this card?",
        }
    }

    fn into_operation(self) -> Operation {
        match self {
            Confirm::DeleteSet { set_id } => Operation::DeleteSet { set_id },
            Confirm::DeleteCard { set_id, card_id } => Operation::DeleteCard { set_id, card_id },
        }
    }
}

#[derive(Debug, Default)]
pub struct Controller {
    view: View,
    current_set: Option<String>,
    session: Option<Session>,
    pub flashcards: FlashcardSession,
    pub learn: LearnSession,
    pub test: Option<Result<TestSession, NotEnoughCards>>,
    pub card_form: CardForm,
    pub rename_form: RenameForm,
    /// Name typed into the "new set" dialog while it is open.
    pub new_set_name: Option<String>,
    confirm: Option<Confirm>,
    notice: Option<String>,
}

impl Controller {
    pub fn new(session: Option<Session>) -> Self {
        Self { session, ..Self::default() }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn current_set_id(&self) -> Option<&str> {
        self.current_set.as_deref()
    }

    pub fn current_set<'a>(&self, snapshot: &'a SyncSnapshot) -> Option<&'a VocabSet> {
        self.current_set.as_deref().and_then(|id| snapshot.find_set(id))
    }

    /// Opens `set` on `view` with fresh study state.
    pub fn open(&mut self, set: &VocabSet, view: View) {
        self.open_with_rng(set, view, &mut rand::rng());
    }

    pub fn open_with_rng<R: Rng + ?Sized>(&mut self, set: &VocabSet, view: View, rng: &mut R) {
        debug!(set_id = %set.id, view = ?view, "opening set");
        self.current_set = Some(set.id.clone());
        self.view = view;
        self.flashcards = FlashcardSession::new();
        self.learn = LearnSession::new();
        self.test = (view == View::Test).then(|| TestSession::new(set, rng));
        self.card_form = CardForm::default();
        self.rename_form = RenameForm::default();
    }

    pub fn back_to_dashboard(&mut self) {
        self.view = View::Dashboard;
        self.current_set = None;
        self.test = None;
        self.rename_form.cancel();
    }

    /// Falls back to the dashboard when the open set no longer exists.
    /// Skipped while loading, since the collection may be mid-replacement.
    pub fn resolve(&mut self, snapshot: &SyncSnapshot) {
        if snapshot.loading || !self.view.needs_set() {
            return;
        }
        if self.current_set(snapshot).is_none() {
            debug!("open set vanished, returning to dashboard");
            self.back_to_dashboard();
        }
    }

    /// Advances pending card transitions. True when something moved.
    pub fn tick(&mut self, now: Instant) -> bool {
        let flashcards = self.flashcards.settle(now);
        let learn = self.learn.settle(now);
        flashcards || learn
    }

    pub fn apply(&mut self, result: &TaskResult, snapshot: &SyncSnapshot) {
        match result {
            TaskResult::SetCreated(Some(set)) => {
                let created = snapshot.find_set(&set.id).unwrap_or(set).clone();
                self.open(&created, View::Manage);
            }
            TaskResult::SetDeleted { set_id, ok: true } => {
                if self.current_set.as_deref() == Some(set_id.as_str()) {
                    self.back_to_dashboard();
                }
            }
            TaskResult::CardAdded { card, .. } => self.card_form.finish(card.is_some()),
            TaskResult::SessionStarted => self.resolve(snapshot),
            _ => {}
        }
    }

    pub fn begin_new_set(&mut self) {
        self.new_set_name = Some(String::new());
    }

    pub fn cancel_new_set(&mut self) {
        self.new_set_name = None;
    }

    /// Closes the dialog and yields a create for a non-blank name.
    pub fn submit_new_set(&mut self) -> Option<Operation> {
        let raw = self.new_set_name.take()?;
        validate_set_name(&raw).map(|name| Operation::CreateSet { name })
    }

    pub fn submit_rename(&mut self, snapshot: &SyncSnapshot) -> Option<Operation> {
        let set = self.current_set(snapshot)?;
        let set_id = set.id.clone();
        let name = self.rename_form.submit(&set.name)?;
        Some(Operation::RenameSet { set_id, name })
    }

    pub fn submit_card(&mut self) -> Option<Operation> {
        let set_id = self.current_set.clone()?;
        let card = self.card_form.submit()?;
        Some(Operation::AddCard { set_id, card })
    }

    /// Asks for confirmation, or shows why the set cannot be deleted.
    pub fn request_delete_set(&mut self, set_id: &str, total_sets: usize) {
        match can_delete_set(total_sets) {
            Ok(()) => self.confirm = Some(Confirm::DeleteSet { set_id: set_id.to_string() }),
            Err(blocked) => self.notice = Some(blocked.to_string()),
        }
    }

    pub fn request_delete_card(&mut self, card_id: &str) {
        if let Some(set_id) = self.current_set.clone() {
            self.confirm = Some(Confirm::DeleteCard { set_id, card_id: card_id.to_string() });
        }
    }

    pub fn pending_confirm(&self) -> Option<&Confirm> {
        self.confirm.as_ref()
    }

    pub fn confirm(&mut self) -> Option<Operation> {
        self.confirm.take().map(Confirm::into_operation)
    }

    pub fn cancel_confirm(&mut self) {
        self.confirm = None;
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn identity_label(&self) -> &str {
        self.session.as_ref().map_or(ANONYMOUS, Session::display_name)
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Drops the session and reloads in the anonymous scope.
    pub fn sign_out(&mut self) -> Operation {
        self.session = None;
        self.back_to_dashboard();
        Operation::StartSession(None)
    }

    pub fn start(&self) -> Operation {
        Operation::StartSession(self.session.clone())
    }
}
