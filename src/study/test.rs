use std::collections::HashMap;

use rand::{
    seq::{
        IndexedRandom,
        SliceRandom,
    },
    Rng,
};
use thiserror::Error;

use crate::core::{
    Card,
    VocabSet,
};

pub const MIN_TEST_CARDS: usize = 4;
pub const PASS_PERCENTAGE: u32 = 80;
const DISTRACTORS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("You need at least {} cards to take a test!", MIN_TEST_CARDS)]
pub struct NotEnoughCards {
    pub have: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub card: Card,
    pub options: Vec<String>,
    pub correct: String,
}

impl Question {
    pub fn prompt(&self, number: usize) -> String {
        format!("{}. What is the meaning of \"{}\"?", number, self.card.term)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
    pub percentage: u32,
}

impl Score {
    fn new(correct: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (correct as f64 / total as f64 * 100.0).round() as u32
        };
        Self { correct, total, percentage }
    }

    pub fn passed(&self) -> bool {
        self.percentage >= PASS_PERCENTAGE
    }

    pub fn summary(&self) -> String {
        format!("You got {} out of {} correct!", self.correct, self.total)
    }
}

/// Multiple-choice quiz over a snapshot of the set's cards.
///
/// Questions are drawn once when the session starts; retaking keeps them and
/// only clears the answers.
#[derive(Debug, Clone)]
pub struct TestSession {
    questions: Vec<Question>,
    answers: HashMap<String, String>,
    score: Option<Score>,
}

impl TestSession {
    pub fn new<R: Rng + ?Sized>(set: &VocabSet, rng: &mut R) -> Result<Self, NotEnoughCards> {
        if set.cards.len() < MIN_TEST_CARDS {
            return Err(NotEnoughCards { have: set.cards.len() });
        }
        Ok(Self { questions: generate_questions(&set.cards, rng), answers: HashMap::new(), score: None })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Records the chosen option. Ignored once the test is submitted or for
    /// cards that are not part of it.
    pub fn answer(&mut self, card_id: &str, option: &str) {
        if self.score.is_some() || !self.questions.iter().any(|q| q.card.id == card_id) {
            return;
        }
        self.answers.insert(card_id.to_string(), option.to_string());
    }

    pub fn selected(&self, card_id: &str) -> Option<&str> {
        self.answers.get(card_id).map(String::as_str)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn subtitle(&self) -> String {
        format!("{} / {} answered", self.answered_count(), self.questions.len())
    }

    pub fn can_submit(&self) -> bool {
        self.score.is_none() && self.answers.len() == self.questions.len()
    }

    pub fn submit(&mut self) -> Option<Score> {
        if !self.can_submit() {
            return None;
        }
        let correct = self
            .questions
            .iter()
            .filter(|q| self.answers.get(&q.card.id) == Some(&q.correct))
            .count();
        let score = Score::new(correct, self.questions.len());
        self.score = Some(score);
        Some(score)
    }

    pub fn score(&self) -> Option<Score> {
        self.score
    }

    pub fn retake(&mut self) {
        self.answers.clear();
        self.score = None;
    }
}

/// One question per card: its definition plus up to three definitions of
/// other cards, in random order.
pub fn generate_questions<R: Rng + ?Sized>(cards: &[Card], rng: &mut R) -> Vec<Question> {
    cards
        .iter()
        .map(|card| {
            let others: Vec<&String> =
                cards.iter().filter(|other| other.id != card.id).map(|other| &other.definition).collect();

            let mut options: Vec<String> = Vec::with_capacity(DISTRACTORS + 1);
            options.push(card.definition.clone());
            options.extend(others.choose_multiple(rng, DISTRACTORS).map(|d| (*d).clone()));
            options.shuffle(rng);

            Question { card: card.clone(), options, correct: card.definition.clone() }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{
        rngs::StdRng,
        SeedableRng,
    };

    use super::*;

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

    fn answer_all(session: &mut TestSession, correct: usize) {
        let picks: Vec<(String, String)> = session
            .questions()
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let pick = if i < correct {
                    q.correct.clone()
                } else {
                    q.options.iter().find(|o| **o != q.correct).cloned().unwrap()
                };
                (q.card.id.clone(), pick)
            })
            .collect();
        for (card_id, pick) in picks {
            session.answer(&card_id, &pick);
        }
    }

    #[test]
    fn requires_four_cards() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = TestSession::new(&set_of(3), &mut rng).unwrap_err();
        assert_eq!(err, NotEnoughCards { have: 3 });
        assert_eq!(err.to_string(), "You need at least 4 cards to take a test!");
        assert!(TestSession::new(&set_of(4), &mut rng).is_ok());
    }

    #[test]
    fn every_question_has_four_distinct_options_including_the_answer() {
        let mut rng = StdRng::seed_from_u64(7);
        let session = TestSession::new(&set_of(6), &mut rng).unwrap();

        assert_eq!(session.questions().len(), 6);
        for q in session.questions() {
            assert_eq!(q.options.len(), 4);
            assert_eq!(q.correct, q.card.definition);
            assert!(q.options.contains(&q.correct));
            let mut unique = q.options.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), 4);
        }
    }

    #[test]
    fn four_card_set_uses_every_other_definition_as_distractor() {
        let set = set_of(4);
        let session = TestSession::new(&set, &mut StdRng::seed_from_u64(13)).unwrap();

        let mut all: Vec<String> = set.cards.iter().map(|c| c.definition.clone()).collect();
        all.sort();
        for q in session.questions() {
            let mut options = q.options.clone();
            options.sort();
            assert_eq!(options, all);
        }
    }

    #[test]
    fn same_seed_same_test() {
        let set = set_of(5);
        let a = TestSession::new(&set, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = TestSession::new(&set, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a.questions(), b.questions());
    }

    #[test]
    fn submit_needs_every_answer() {
        let mut session = TestSession::new(&set_of(4), &mut StdRng::seed_from_u64(3)).unwrap();
        let first = session.questions()[0].clone();

        session.answer(&first.card.id, &first.correct);
        session.answer("not-in-test", "x");

        assert_eq!(session.answered_count(), 1);
        assert_eq!(session.subtitle(), "1 / 4 answered");
        assert!(!session.can_submit());
        assert_eq!(session.submit(), None);
    }

    #[test]
    fn score_rounds_to_nearest_percent() {
        let mut session = TestSession::new(&set_of(6), &mut StdRng::seed_from_u64(9)).unwrap();
        answer_all(&mut session, 5);

        let score = session.submit().unwrap();

        assert_eq!(score, Score { correct: 5, total: 6, percentage: 83 });
        assert!(score.passed());
        assert_eq!(score.summary(), "You got 5 out of 6 correct!");
    }

    #[test]
    fn below_eighty_percent_fails() {
        let mut session = TestSession::new(&set_of(4), &mut StdRng::seed_from_u64(11)).unwrap();
        answer_all(&mut session, 3);

        let score = session.submit().unwrap();

        assert_eq!(score.percentage, 75);
        assert!(!score.passed());
    }

    #[test]
    fn no_correct_answers_scores_zero() {
        let mut session = TestSession::new(&set_of(5), &mut StdRng::seed_from_u64(17)).unwrap();
        answer_all(&mut session, 0);

        let score = session.submit().unwrap();

        assert_eq!(score, Score { correct: 0, total: 5, percentage: 0 });
        assert!(!score.passed());
    }

    #[test]
    fn retake_keeps_questions_and_clears_answers() {
        let mut session = TestSession::new(&set_of(4), &mut StdRng::seed_from_u64(5)).unwrap();
        let questions = session.questions().to_vec();
        answer_all(&mut session, 4);
        assert_eq!(session.submit().map(|s| s.percentage), Some(100));

        session.retake();

        assert_eq!(session.questions(), questions.as_slice());
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.score(), None);
    }
}
