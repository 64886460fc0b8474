use crate::{
    core::{
        Card,
        Session,
        VocabSet,
    },
    study::NewCard,
    sync::FetchOutcome,
};

/// A write or reload the GUI asks the sync engine to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    StartSession(Option<Session>),
    Refresh,
    CreateSet { name: String },
    RenameSet { set_id: String, name: String },
    DeleteSet { set_id: String },
    AddCard { set_id: String, card: NewCard },
    DeleteCard { set_id: String, card_id: String },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::StartSession(_) => "start_session",
            Operation::Refresh => "refresh",
            Operation::CreateSet { .. } => "create_set",
            Operation::RenameSet { .. } => "rename_set",
            Operation::DeleteSet { .. } => "delete_set",
            Operation::AddCard { .. } => "add_card",
            Operation::DeleteCard { .. } => "delete_card",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    SessionStarted,
    Refreshed(FetchOutcome),
    SetCreated(Option<VocabSet>),
    SetRenamed { set_id: String, ok: bool },
    SetDeleted { set_id: String, ok: bool },
    CardAdded { set_id: String, card: Option<Card> },
    CardDeleted { set_id: String, card_id: String, ok: bool },
}

impl TaskResult {
    pub fn task_type(&self) -> &'static str {
        match self {
            TaskResult::SessionStarted => "start_session",
            TaskResult::Refreshed(_) => "refresh",
            TaskResult::SetCreated(_) => "create_set",
            TaskResult::SetRenamed { .. } => "rename_set",
            TaskResult::SetDeleted { .. } => "delete_set",
            TaskResult::CardAdded { .. } => "add_card",
            TaskResult::CardDeleted { .. } => "delete_card",
        }
    }

    pub fn succeeded(&self) -> bool {
        match self {
            TaskResult::SessionStarted => true,
            TaskResult::Refreshed(outcome) => *outcome == FetchOutcome::Fresh,
            TaskResult::SetCreated(set) => set.is_some(),
            TaskResult::CardAdded { card, .. } => card.is_some(),
            TaskResult::SetRenamed { ok, .. }
            | TaskResult::SetDeleted { ok, .. }
            | TaskResult::CardDeleted { ok, .. } => *ok,
        }
    }
}
