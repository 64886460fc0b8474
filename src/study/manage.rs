/// A validated card ready to be sent to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub term: String,
    pub definition: String,
}

/// Inputs of the "add card" form.
#[derive(Debug, Clone, Default)]
pub struct CardForm {
    pub term: String,
    pub definition: String,
    busy: bool,
}

impl CardForm {
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn can_submit(&self) -> bool {
        !self.busy && !self.term.trim().is_empty() && !self.definition.trim().is_empty()
    }

    /// Trimmed card, or `None` while busy or with a blank field. The form
    /// stays busy until [`CardForm::finish`] is called.
    pub fn submit(&mut self) -> Option<NewCard> {
        if !self.can_submit() {
            return None;
        }
        self.busy = true;
        Some(NewCard {
            term: self.term.trim().to_string(),
            definition: self.definition.trim().to_string(),
        })
    }

    /// Inputs are cleared only when the card was added.
    pub fn finish(&mut self, added: bool) {
        self.busy = false;
        if added {
            self.term.clear();
            self.definition.clear();
        }
    }
}

/// Inline editor for a set name.
#[derive(Debug, Clone, Default)]
pub struct RenameForm {
    pub name: String,
    editing: bool,
}

impl RenameForm {
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn begin(&mut self, current: &str) {
        self.name = current.to_string();
        self.editing = true;
    }

    pub fn cancel(&mut self) {
        self.editing = false;
        self.name.clear();
    }

    /// The trimmed new name when it is non-blank and differs from `current`.
    pub fn submit(&mut self, current: &str) -> Option<String> {
        let name = self.name.trim().to_string();
        self.cancel();
        (!name.is_empty() && name != current).then_some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_form_trims_and_clears_on_success() {
        let mut form = CardForm { term: "  perro ".into(), definition: " dog".into(), ..Default::default() };

        let card = form.submit().unwrap();
        assert_eq!(card, NewCard { term: "perro".into(), definition: "dog".into() });
        assert!(form.is_busy());
        assert_eq!(form.submit(), None);

        form.finish(true);
        assert!(!form.is_busy());
        assert!(form.term.is_empty() && form.definition.is_empty());
    }

    #[test]
    fn card_form_keeps_inputs_on_failure() {
        let mut form = CardForm { term: "gato".into(), definition: "cat".into(), ..Default::default() };
        form.submit().unwrap();

        form.finish(false);

        assert_eq!(form.term, "gato");
        assert!(form.can_submit());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut form = CardForm { term: "   ".into(), definition: "cat".into(), ..Default::default() };
        assert_eq!(form.submit(), None);
        assert!(!form.is_busy());
    }

    #[test]
    fn rename_requires_a_different_non_blank_name() {
        let mut form = RenameForm::default();

        form.begin("Spanish");
        assert!(form.is_editing());
        assert_eq!(form.submit("Spanish"), None);
        assert!(!form.is_editing());

        form.begin("Spanish");
        form.name = "   ".into();
        assert_eq!(form.submit("Spanish"), None);

        form.begin("Spanish");
        form.name = " Español ".into();
        assert_eq!(form.submit("Spanish").as_deref(), Some("Español"));
    }
}
