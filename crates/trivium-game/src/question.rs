//! Question data and the source trait.
//!
//! Where questions actually live (database, file, third-party API) is
//! someone else's problem: the game only needs a [`QuestionSource`].
//! [`StaticQuestionSource`] serves a fixed in-memory set for demos and
//! tests.

use std::fmt;
use std::str::FromStr;

/// A single trivia question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub category: String,
    /// Canonical correct answer, as judged by the [`AnswerOracle`].
    ///
    /// [`AnswerOracle`]: crate::AnswerOracle
    pub answer: String,
    /// Distractors for multiple-choice mode. `None` means the question
    /// is free-text only, even when the room has multiple choice on.
    pub wrong_answers: Option<[String; 3]>,
    /// Difficulty tier, 1 (easiest) through 5 (hardest).
    pub tier: u8,
}

/// Room difficulty setting, mapped to a tier range when drawing
/// questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Difficulty {
    #[default]
    Enjoyer,
    Connoisseur,
    Savant,
}

impl Difficulty {
    /// Inclusive tier range questions are drawn from.
    pub fn tier_range(self) -> (u8, u8) {
        match self {
            Self::Enjoyer => (1, 2),
            Self::Connoisseur => (3, 4),
            Self::Savant => (4, 5),
        }
    }

    /// The wire-level name, as carried in config snapshots/updates.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enjoyer => "enjoyer",
            Self::Connoisseur => "connoisseur",
            Self::Savant => "savant",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enjoyer" => Ok(Self::Enjoyer),
            "connoisseur" => Ok(Self::Connoisseur),
            "savant" => Ok(Self::Savant),
            _ => Err(()),
        }
    }
}

/// Supplies questions for new games.
///
/// Implementations may be backed by anything; they run on the room's
/// serialized event path, so a slow source only slows its own room.
pub trait QuestionSource: Send + Sync + 'static {
    /// Draws up to `count` questions, any tier.
    fn questions(&self, count: usize) -> Vec<Question>;

    /// Draws up to `count` questions within an inclusive tier range.
    fn questions_by_difficulty(
        &self,
        count: usize,
        min_tier: u8,
        max_tier: u8,
    ) -> Vec<Question>;
}

/// A [`QuestionSource`] over a fixed in-memory set.
///
/// Draws in a shuffled order so consecutive games differ.
#[derive(Debug, Clone, Default)]
pub struct StaticQuestionSource {
    questions: Vec<Question>,
}

impl StaticQuestionSource {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }
}

impl QuestionSource for StaticQuestionSource {
    fn questions(&self, count: usize) -> Vec<Question> {
        use rand::seq::SliceRandom;

        let mut pool = self.questions.clone();
        pool.shuffle(&mut rand::rng());
        pool.truncate(count);
        pool
    }

    fn questions_by_difficulty(
        &self,
        count: usize,
        min_tier: u8,
        max_tier: u8,
    ) -> Vec<Question> {
        use rand::seq::SliceRandom;

        let mut pool: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| (min_tier..=max_tier).contains(&q.tier))
            .cloned()
            .collect();
        pool.shuffle(&mut rand::rng());
        pool.truncate(count);
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, tier: u8) -> Question {
        Question {
            text: text.into(),
            category: "General".into(),
            answer: "x".into(),
            wrong_answers: None,
            tier,
        }
    }

    #[test]
    fn test_difficulty_parses_known_names() {
        assert_eq!("enjoyer".parse(), Ok(Difficulty::Enjoyer));
        assert_eq!("savant".parse(), Ok(Difficulty::Savant));
        assert!("nightmare".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_static_source_filters_by_tier() {
        let source = StaticQuestionSource::new(vec![
            question("easy", 1),
            question("medium", 3),
            question("hard", 5),
        ]);
        let drawn = source.questions_by_difficulty(10, 3, 4);
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].text, "medium");
    }

    #[test]
    fn test_static_source_caps_at_count() {
        let source = StaticQuestionSource::new(
            (0..20).map(|i| question(&format!("q{i}"), 1)).collect(),
        );
        assert_eq!(source.questions(5).len(), 5);
    }

    #[test]
    fn test_static_source_returns_fewer_when_pool_is_small() {
        let source = StaticQuestionSource::new(vec![question("only", 2)]);
        assert_eq!(source.questions(10).len(), 1);
    }
}
