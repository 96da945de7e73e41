//! Answer judging.
//!
//! Whether a submitted answer matches the canonical one is pluggable:
//! production deployments may call out to a fuzzy matcher, tests use
//! exact matching. [`NormalizingOracle`] is the shipped default.

/// Decides whether a submitted answer is correct.
///
/// Implementations must be pure (same inputs, same verdict). They run
/// on the room's serialized event path, so an expensive oracle slows
/// only the room that's judging.
pub trait AnswerOracle: Send + Sync + 'static {
    fn is_correct(&self, submitted: &str, canonical: &str) -> bool;
}

/// Case-, whitespace-, and punctuation-insensitive comparison.
///
/// "Mona  Lisa!" matches "mona lisa". Not a fuzzy matcher — typos
/// still miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizingOracle;

impl NormalizingOracle {
    fn normalize(s: &str) -> String {
        s.chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect()
    }
}

impl AnswerOracle for NormalizingOracle {
    fn is_correct(&self, submitted: &str, canonical: &str) -> bool {
        let submitted = Self::normalize(submitted);
        !submitted.is_empty() && submitted == Self::normalize(canonical)
    }
}
