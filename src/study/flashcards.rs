use std::time::Instant;

use super::CardCursor;
use crate::core::{
    Card,
    VocabSet,
};

/// Browse a set one card at a time, flipping between term and definition.
#[derive(Debug, Clone, Default)]
pub struct FlashcardSession {
    cursor: CardCursor,
}

impl FlashcardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current<'a>(&self, set: &'a VocabSet) -> Option<&'a Card> {
        set.cards.get(self.cursor.index(set.cards.len()))
    }

    pub fn is_flipped(&self) -> bool {
        self.cursor.is_flipped()
    }

    pub fn flip(&mut self) {
        self.cursor.flip();
    }

    pub fn next(&mut self, set: &VocabSet, now: Instant) {
        let len = set.cards.len();
        if len == 0 {
            return;
        }
        let target = (self.cursor.target(len) + 1) % len;
        self.cursor.move_to(target, now);
    }

    pub fn previous(&mut self, set: &VocabSet, now: Instant) {
        let len = set.cards.len();
        if len == 0 {
            return;
        }
        let target = (self.cursor.target(len) + len - 1) % len;
        self.cursor.move_to(target, now);
    }

    pub fn settle(&mut self, now: Instant) -> bool {
        self.cursor.settle(now)
    }

    pub fn is_moving(&self) -> bool {
        self.cursor.is_moving()
    }

    /// 1-based position and card count, `None` for an empty set.
    pub fn position(&self, set: &VocabSet) -> Option<(usize, usize)> {
        let len = set.cards.len();
        (len > 0).then(|| (self.cursor.index(len) + 1, len))
    }

    pub fn subtitle(&self, set: &VocabSet) -> Option<String> {
        self.position(set).map(|(current, total)| format!("{} / {}", current, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::FLIP_RESET_DELAY;

    fn set_of(terms: &[&str]) -> VocabSet {
        VocabSet {
            id: "s".to_string(),
            name: "Set".to_string(),
            cards: terms
                .iter()
                .enumerate()
                .map(|(i, term)| Card {
                    id: format!("c{i}"),
                    term: term.to_string(),
                    definition: format!("{term}!"),
                })
                .collect(),
        }
    }

    fn step(session: &mut FlashcardSession, now: &mut Instant) {
        *now += FLIP_RESET_DELAY;
        session.settle(*now);
    }

    #[test]
    fn navigation_wraps_both_ways() {
        let set = set_of(&["a", "b", "c"]);
        let mut session = FlashcardSession::new();
        let mut now = Instant::now();

        session.previous(&set, now);
        step(&mut session, &mut now);
        assert_eq!(session.current(&set).unwrap().term, "c");
        assert_eq!(session.subtitle(&set).as_deref(), Some("3 / 3"));

        session.next(&set, now);
        step(&mut session, &mut now);
        assert_eq!(session.current(&set).unwrap().term, "a");
    }

    #[test]
    fn navigation_turns_the_card_face_up() {
        let set = set_of(&["a", "b"]);
        let mut session = FlashcardSession::new();
        let now = Instant::now();

        session.flip();
        assert!(session.is_flipped());

        session.next(&set, now);
        assert!(!session.is_flipped());
        // Still showing the old card until the flip back finishes.
        assert_eq!(session.current(&set).unwrap().term, "a");
        session.settle(now + FLIP_RESET_DELAY);
        assert_eq!(session.current(&set).unwrap().term, "b");
    }

    #[test]
    fn rapid_moves_chain() {
        let set = set_of(&["a", "b", "c", "d"]);
        let mut session = FlashcardSession::new();
        let now = Instant::now();

        session.next(&set, now);
        session.next(&set, now);
        session.settle(now + FLIP_RESET_DELAY);

        assert_eq!(session.position(&set), Some((3, 4)));
    }

    #[test]
    fn empty_set_has_no_card() {
        let set = set_of(&[]);
        let mut session = FlashcardSession::new();

        session.next(&set, Instant::now());

        assert!(session.current(&set).is_none());
        assert!(!session.is_moving());
        assert_eq!(session.subtitle(&set), None);
    }
}
