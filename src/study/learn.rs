use std::{
    collections::HashSet,
    time::Instant,
};

use super::CardCursor;
use crate::core::{
    Card,
    VocabSet,
};

/// Self-graded drill: cards marked "got it" are skipped until every card in
/// the set is mastered.
#[derive(Debug, Clone, Default)]
pub struct LearnSession {
    cursor: CardCursor,
    mastered: HashSet<String>,
}

impl LearnSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current<'a>(&self, set: &'a VocabSet) -> Option<&'a Card> {
        if self.is_complete(set) {
            return None;
        }
        set.cards.get(self.cursor.index(set.cards.len()))
    }

    pub fn is_flipped(&self) -> bool {
        self.cursor.is_flipped()
    }

    pub fn flip(&mut self) {
        self.cursor.flip();
    }

    pub fn settle(&mut self, now: Instant) -> bool {
        self.cursor.settle(now)
    }

    pub fn is_moving(&self) -> bool {
        self.cursor.is_moving()
    }

    /// Moves to the next card not yet mastered, trying each card at most
    /// once.
    pub fn still_learning(&mut self, set: &VocabSet, now: Instant) {
        let len = set.cards.len();
        if len == 0 {
            return;
        }

        let mut next = self.cursor.target(len);
        for _ in 0..len {
            next = (next + 1) % len;
            if !self.mastered.contains(&set.cards[next].id) {
                break;
            }
        }
        self.cursor.move_to(next, now);
    }

    /// Masters the card being shown and moves on unless the set is done.
    pub fn got_it(&mut self, set: &VocabSet, now: Instant) {
        let len = set.cards.len();
        if len == 0 {
            return;
        }

        let shown = &set.cards[self.cursor.index(len)];
        self.mastered.insert(shown.id.clone());
        if !self.is_complete(set) {
            self.still_learning(set, now);
        }
    }

    /// Mastered cards still present in the set.
    pub fn mastered_count(&self, set: &VocabSet) -> usize {
        set.cards.iter().filter(|card| self.mastered.contains(&card.id)).count()
    }

    pub fn is_mastered(&self, card_id: &str) -> bool {
        self.mastered.contains(card_id)
    }

    pub fn is_complete(&self, set: &VocabSet) -> bool {
        !set.cards.is_empty() && self.mastered_count(set) == set.cards.len()
    }

    /// Share of the set mastered, 0 to 100.
    pub fn progress(&self, set: &VocabSet) -> f32 {
        if set.cards.is_empty() {
            return 0.0;
        }
        self.mastered_count(set) as f32 / set.cards.len() as f32 * 100.0
    }

    pub fn subtitle(&self, set: &VocabSet) -> String {
        format!("{} / {} mastered", self.mastered_count(set), set.cards.len())
    }

    /// Start over: nothing mastered, back at the first card.
    pub fn reset(&mut self) {
        self.mastered.clear();
        self.cursor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::FLIP_RESET_DELAY;

    fn set_of(len: usize) -> VocabSet {
        VocabSet {
            id: "s".to_string(),
            name: "Set".to_string(),
            cards: (0..len)
                .map(|i| Card {
                    id: format!("c{i}"),
                    term: format!("t{i}"),
                    definition: format!("d{i}"),
                })
                .collect(),
        }
    }

    fn settled(session: &mut LearnSession, now: &mut Instant) {
        *now += FLIP_RESET_DELAY;
        session.settle(*now);
    }

    #[test]
    fn got_it_skips_mastered_cards() {
        let set = set_of(3);
        let mut session = LearnSession::new();
        let mut now = Instant::now();

        session.got_it(&set, now);
        settled(&mut session, &mut now);
        assert_eq!(session.current(&set).unwrap().id, "c1");

        session.still_learning(&set, now);
        settled(&mut session, &mut now);
        assert_eq!(session.current(&set).unwrap().id, "c2");

        // c0 is mastered, so wrapping around lands on c1.
        session.still_learning(&set, now);
        settled(&mut session, &mut now);
        assert_eq!(session.current(&set).unwrap().id, "c1");
        assert_eq!(session.subtitle(&set), "1 / 3 mastered");
    }

    #[test]
    fn mastering_everything_completes() {
        let set = set_of(2);
        let mut session = LearnSession::new();
        let mut now = Instant::now();

        session.got_it(&set, now);
        settled(&mut session, &mut now);
        session.got_it(&set, now);

        assert!(session.is_complete(&set));
        assert_eq!(session.progress(&set), 100.0);
        assert!(session.current(&set).is_none());

        session.reset();
        assert_eq!(session.mastered_count(&set), 0);
        assert_eq!(session.current(&set).unwrap().id, "c0");
    }

    #[test]
    fn single_unmastered_card_stays_put() {
        let set = set_of(3);
        let mut session = LearnSession::new();
        let mut now = Instant::now();

        session.got_it(&set, now);
        settled(&mut session, &mut now);
        session.got_it(&set, now);
        settled(&mut session, &mut now);
        assert_eq!(session.current(&set).unwrap().id, "c2");

        session.still_learning(&set, now);
        settled(&mut session, &mut now);
        assert_eq!(session.current(&set).unwrap().id, "c2");
    }

    #[test]
    fn shrinking_set_is_tolerated() {
        let full = set_of(4);
        let mut session = LearnSession::new();
        let mut now = Instant::now();

        for _ in 0..3 {
            session.still_learning(&full, now);
            settled(&mut session, &mut now);
        }
        session.got_it(&full, now);
        settled(&mut session, &mut now);

        let mut shrunk = full.clone();
        shrunk.cards.truncate(2);

        assert_eq!(session.mastered_count(&shrunk), 0);
        assert!(session.current(&shrunk).is_some());
        assert_eq!(session.progress(&shrunk), 0.0);
    }

    #[test]
    fn empty_set_has_nothing_to_learn() {
        let set = set_of(0);
        let mut session = LearnSession::new();

        session.got_it(&set, Instant::now());
        session.still_learning(&set, Instant::now());

        assert!(!session.is_complete(&set));
        assert_eq!(session.progress(&set), 0.0);
        assert_eq!(session.subtitle(&set), "0 / 0 mastered");
    }
}
