use std::{cmp::Ordering, fmt::Display};

use serde::Serialize;

/// A partial or complete labelling of the input.
///
/// Sequences are never mutated once built: [`Sequence::extend`] returns a new
/// value carrying one more `(outcome, probability)` pair. The score is the sum
/// of the natural logarithms of all step probabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Sequence {
    outcomes: Vec<String>,
    #[serde(rename = "probabilities")]
    probs: Vec<f64>,
    score: f64,
}

impl Sequence {
    /// The search root: no outcomes, score 0.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends `outcome` with probability `prob` to a copy of `self`.
    ///
    /// A probability of 0 gives a score of `-inf`, which ranks below every
    /// finite score.
    #[must_use]
    pub fn extend(&self, outcome: impl Into<String>, prob: f64) -> Self {
        let mut outcomes = Vec::with_capacity(self.outcomes.len() + 1);
        outcomes.extend_from_slice(&self.outcomes);
        outcomes.push(outcome.into());
        let mut probs = Vec::with_capacity(self.probs.len() + 1);
        probs.extend_from_slice(&self.probs);
        probs.push(prob);
        Self { outcomes, probs, score: self.score + prob.ln() }
    }

    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    /// Per-step probabilities, parallel to [`Sequence::outcomes`].
    pub fn probabilities(&self) -> &[f64] {
        &self.probs
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Score used for ranking. NaN is treated like `-inf` so it is never preferred.
    pub(crate) fn rank(&self) -> f64 {
        if self.score.is_nan() {
            f64::NEG_INFINITY
        } else {
            self.score
        }
    }
}

/// Equality is score equality only; distinct label paths with the same score
/// compare equal.
impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Sequence {}

impl PartialOrd for Sequence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Better sequences sort first: a higher score compares as `Less`.
impl Ord for Sequence {
    fn cmp(&self, other: &Self) -> Ordering {
        other.rank().total_cmp(&self.rank())
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.score, self.outcomes.join(" "))
    }
}
