use crate::{
    app::View,
    core::tasks::Operation,
};

// Collected while drawing and applied after the frame, so view functions only
// need shared access to the app state.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    // Navigation
    Open { set_id: String, view: View },
    BackToDashboard,

    // Sync engine
    Dispatch(Operation),
    ClearError,

    // Dashboard
    BeginNewSet,
    RequestDeleteSet { set_id: String },

    // Study
    Flip,
    Next,
    Previous,
    StillLearning,
    GotIt,
    StartOver,
    Answer { card_id: String, option: String },
    SubmitTest,
    RetakeTest,

    // Manage
    SubmitCard,
    BeginRename,
    SubmitRename,
    CancelRename,
    RequestDeleteCard { card_id: String },

    SignOut,
}

pub struct ActionQueue {
    actions: Vec<UiAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self { actions: Vec::new() }
    }

    pub fn push(&mut self, action: UiAction) {
        self.actions.push(action);
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, UiAction> {
        self.actions.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}
