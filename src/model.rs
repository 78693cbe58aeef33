//! Collaborator contracts consumed by the beam search, and a log-linear scorer.

use std::{collections::HashMap, fs::File, io::BufReader, io::Read, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    quark::{Quark, StringTable},
};

/// Maps a feature context to a probability for every outcome.
pub trait ScoringModel {
    /// One probability per outcome, in outcome index order.
    fn evaluate(&self, context: &[String]) -> Result<Vec<f64>>;
    fn outcome_count(&self) -> usize;
    fn outcome_name(&self, index: usize) -> Option<&str>;
}

impl<M: ScoringModel + ?Sized> ScoringModel for &M {
    fn evaluate(&self, context: &[String]) -> Result<Vec<f64>> {
        (**self).evaluate(context)
    }

    fn outcome_count(&self) -> usize {
        (**self).outcome_count()
    }

    fn outcome_name(&self, index: usize) -> Option<&str> {
        (**self).outcome_name(index)
    }
}

/// Derives the feature context for position `index` given the outcomes decided so far.
pub trait ContextGenerator<T> {
    fn context(
        &self,
        index: usize,
        sequence: &[T],
        prior: &[String],
        additional: &[String],
    ) -> Result<Vec<String>>;
}

impl<T, F> ContextGenerator<T> for F
where
    F: Fn(usize, &[T], &[String], &[String]) -> Result<Vec<String>>,
{
    fn context(
        &self,
        index: usize,
        sequence: &[T],
        prior: &[String],
        additional: &[String],
    ) -> Result<Vec<String>> {
        self(index, sequence, prior, additional)
    }
}

/// Decides whether `outcome` may follow `prior` at position `index`.
pub trait SequenceValidator<T> {
    fn valid(&self, index: usize, sequence: &[T], prior: &[String], outcome: &str) -> bool;
}

impl<T, F> SequenceValidator<T> for F
where
    F: Fn(usize, &[T], &[String], &str) -> bool,
{
    fn valid(&self, index: usize, sequence: &[T], prior: &[String], outcome: &str) -> bool {
        self(index, sequence, prior, outcome)
    }
}

/// Accepts every transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl<T> SequenceValidator<T> for AcceptAll {
    fn valid(&self, _index: usize, _sequence: &[T], _prior: &[String], _outcome: &str) -> bool {
        true
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LinearModelFile {
    outcomes: Vec<String>,
    #[serde(default)]
    weights: HashMap<String, Vec<f64>>,
}

/// Log-linear (maximum entropy) scorer.
///
/// Every known feature in the context contributes one weight per outcome; the
/// summed weights are normalised with a softmax. Unknown features are ignored.
#[derive(Debug)]
pub struct LinearModel {
    outcomes: Quark,
    weights: HashMap<String, Vec<f64>>,
}

impl LinearModel {
    pub fn new(outcomes: Vec<String>, weights: HashMap<String, Vec<f64>>) -> Result<Self> {
        if outcomes.is_empty() {
            return Err(Error::invalid_config("model has no outcomes"));
        }
        let n = outcomes.len();
        let outcomes = Quark::from(outcomes);
        if outcomes.len() != n {
            return Err(Error::invalid_config("duplicate outcome names"));
        }
        if let Some((feature, row)) = weights.iter().find(|(_, row)| row.len() != outcomes.len()) {
            return Err(Error::invalid_config(format!(
                "feature {feature} has {} weights for {} outcomes",
                row.len(),
                outcomes.len()
            )));
        }
        Ok(Self { outcomes, weights })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let file: LinearModelFile = serde_json::from_reader(reader)?;
        Self::new(file.outcomes, file.weights)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn outcomes(&self) -> &Quark {
        &self.outcomes
    }

    pub fn num_features(&self) -> usize {
        self.weights.len()
    }
}

impl ScoringModel for LinearModel {
    fn evaluate(&self, context: &[String]) -> Result<Vec<f64>> {
        let mut sums = vec![0.0; self.outcomes.len()];
        for row in context.iter().filter_map(|f| self.weights.get(f)) {
            for (s, w) in sums.iter_mut().zip(row) {
                *s += w;
            }
        }
        let max = sums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut norm = 0.0;
        for s in &mut sums {
            *s = (*s - max).exp();
            norm += *s;
        }
        for s in &mut sums {
            *s /= norm;
        }
        Ok(sums)
    }

    fn outcome_count(&self) -> usize {
        self.outcomes.len()
    }

    fn outcome_name(&self, index: usize) -> Option<&str> {
        self.outcomes.to_str(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LinearModel {
        let json = r#"{
            "outcomes": ["O", "B-PER", "I-PER"],
            "weights": {
                "w=John": [0.0, 2.0, 0.0],
                "prev=B-PER": [0.0, 0.0, 3.0]
            }
        }"#;
        LinearModel::from_reader(json.as_bytes()).unwrap()
    }

    fn ctx(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_features_give_uniform() {
        let probs = model().evaluate(&ctx(&["w=nobody"])).unwrap();
        for p in probs {
            assert!((p - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn weights_shift_probability_mass() {
        let m = model();
        let probs = m.evaluate(&ctx(&["w=John", "prev=BOS"])).unwrap();
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(probs[1] > probs[0] && probs[1] > probs[2]);
        assert_eq!(m.outcome_name(1), Some("B-PER"));
        assert_eq!(m.outcome_name(3), None);
    }

    #[test]
    fn large_weights_do_not_overflow() {
        let mut weights = HashMap::new();
        weights.insert("f".to_string(), vec![1000.0, 999.0]);
        let m = LinearModel::new(vec!["a".into(), "b".into()], weights).unwrap();
        let probs = m.evaluate(&ctx(&["f", "f"])).unwrap();
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!(probs[0] > probs[1]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut weights = HashMap::new();
        weights.insert("f".to_string(), vec![1.0]);
        let ret = LinearModel::new(vec!["a".into(), "b".into()], weights);
        assert!(matches!(ret, Err(Error::InvalidConfiguration(_))));
        assert!(LinearModel::new(vec![], HashMap::new()).is_err());
    }

    #[test]
    fn closures_are_collaborators() {
        let generator =
            |i: usize, seq: &[&str], _: &[String], _: &[String]| -> Result<Vec<String>> {
                Ok(vec![format!("w={}", seq[i])])
            };
        assert_eq!(generator.context(1, &["a", "b"], &[], &[]).unwrap(), ["w=b"]);
        let no_x = |_: usize, _: &[&str], _: &[String], o: &str| o != "X";
        assert!(!no_x.valid(0, &["a"], &[], "X"));
        assert!(SequenceValidator::<&str>::valid(&AcceptAll, 0, &["a"], &[], "X"));
    }
}
