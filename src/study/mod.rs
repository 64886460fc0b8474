//! Per-screen study state. Sessions borrow the set on every call so they
//! follow changes to the collection while a screen is open.

pub mod dashboard;
pub mod flashcards;
pub mod learn;
pub mod manage;
pub mod test;

use std::time::{
    Duration,
    Instant,
};

pub use dashboard::{
    can_delete_set,
    validate_set_name,
    DeleteBlocked,
};
pub use flashcards::FlashcardSession;
pub use learn::LearnSession;
pub use manage::{
    CardForm,
    NewCard,
    RenameForm,
};
pub use test::{
    NotEnoughCards,
    Question,
    Score,
    TestSession,
    MIN_TEST_CARDS,
};

/// Time the card gets to turn face-up before the next one is shown.
pub const FLIP_RESET_DELAY: Duration = Duration::from_millis(200);

/// Index into a card list plus the flip state of the card shown there.
///
/// Moving turns the card face-up first and commits the new index only after
/// [`FLIP_RESET_DELAY`], so the back of the next card is never visible.
#[derive(Debug, Clone, Default)]
pub struct CardCursor {
    index: usize,
    flipped: bool,
    pending: Option<(usize, Instant)>,
}

impl CardCursor {
    /// Committed index, clamped into `len`.
    pub fn index(&self, len: usize) -> usize {
        self.index.min(len.saturating_sub(1))
    }

    /// Where the cursor is heading. Repeated moves chain from here.
    pub fn target(&self, len: usize) -> usize {
        self.pending.map_or(self.index, |(index, _)| index).min(len.saturating_sub(1))
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    pub fn move_to(&mut self, index: usize, now: Instant) {
        self.flipped = false;
        self.pending = Some((index, now + FLIP_RESET_DELAY));
    }

    pub fn is_moving(&self) -> bool {
        self.pending.is_some()
    }

    /// Commits a pending move once its delay has passed. Returns true when the
    /// index changed.
    pub fn settle(&mut self, now: Instant) -> bool {
        match self.pending {
            Some((index, due)) if now >= due => {
                self.index = index;
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_commits_after_delay() {
        let start = Instant::now();
        let mut cursor = CardCursor::default();
        cursor.flip();

        cursor.move_to(2, start);
        assert!(!cursor.is_flipped());
        assert_eq!(cursor.index(5), 0);
        assert_eq!(cursor.target(5), 2);

        assert!(!cursor.settle(start + Duration::from_millis(100)));
        assert!(cursor.settle(start + FLIP_RESET_DELAY));
        assert_eq!(cursor.index(5), 2);
        assert!(!cursor.is_moving());
    }

    #[test]
    fn index_is_clamped_to_shrunk_lists() {
        let start = Instant::now();
        let mut cursor = CardCursor::default();
        cursor.move_to(4, start);
        cursor.settle(start + FLIP_RESET_DELAY);

        assert_eq!(cursor.index(2), 1);
        assert_eq!(cursor.index(0), 0);
    }
}
