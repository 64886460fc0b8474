use crate::gui::error_modal::ErrorModal;

pub struct Modals {
    pub error: ErrorModal,
}

impl Default for Modals {
    fn default() -> Self {
        Self { error: ErrorModal::new() }
    }
}
