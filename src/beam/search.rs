//! Position-by-position beam decoding.
//!
//! At every position the best hypotheses are pulled from the current
//! frontier, scored through the model (via the evaluation cache), extended by
//! every valid outcome among the top `beam_size` outcomes and pushed into the
//! next frontier. When a hypothesis produces nothing while the next frontier
//! is still empty, it is retried against all outcomes so the search cannot
//! die out just because the likeliest outcomes are invalid.

use log::{debug, trace};

use crate::{
    error::{Error, Result},
    model::{AcceptAll, ContextGenerator, ScoringModel, SequenceValidator},
};

use super::{
    cache::{EvaluationCache, Scores},
    config::BeamConfig,
    frontier::BoundedFrontier,
    sequence::Sequence,
};

/// Beam search decoder.
///
/// The evaluation cache lives as long as the decoder, so reusing one instance
/// across calls shares memoized model scores. A decoder must not be shared
/// between threads without external synchronisation; build one per thread.
#[derive(Debug)]
pub struct BeamSearch<M, G, V = AcceptAll> {
    model: M,
    context_generator: G,
    validator: V,
    beam_size: usize,
    min_sequence_score: f64,
    cache: EvaluationCache,
}

impl<M: ScoringModel, G> BeamSearch<M, G, AcceptAll> {
    pub fn new(model: M, context_generator: G, config: &BeamConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "beam search: beam_size={}, cache_size={}, outcomes={}",
            config.beam_size,
            config.cache_size,
            model.outcome_count()
        );
        Ok(Self {
            model,
            context_generator,
            validator: AcceptAll,
            beam_size: config.beam_size,
            min_sequence_score: config.min_sequence_score,
            cache: EvaluationCache::new(config.cache_size),
        })
    }
}

impl<M, G, V> BeamSearch<M, G, V> {
    /// Replaces the transition validator.
    pub fn with_validator<W>(self, validator: W) -> BeamSearch<M, G, W> {
        BeamSearch {
            model: self.model,
            context_generator: self.context_generator,
            validator,
            beam_size: self.beam_size,
            min_sequence_score: self.min_sequence_score,
            cache: self.cache,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    pub fn beam_size(&self) -> usize {
        self.beam_size
    }
}

impl<M: ScoringModel, G, V> BeamSearch<M, G, V> {
    /// Best labelling of `sequence`, or `None` if every path was pruned.
    pub fn best_sequence<T>(
        &mut self,
        sequence: &[T],
        additional: &[String],
    ) -> Result<Option<Sequence>>
    where
        G: ContextGenerator<T>,
        V: SequenceValidator<T>,
    {
        let min = self.min_sequence_score;
        Ok(self.best_sequences(1, sequence, additional, min)?.into_iter().next())
    }

    /// Up to `num_sequences` complete labellings of `sequence`, best first.
    ///
    /// Hypotheses whose score is not above `min_sequence_score` are pruned.
    /// A NaN floor is rejected as invalid configuration.
    pub fn best_sequences<T>(
        &mut self,
        num_sequences: usize,
        sequence: &[T],
        additional: &[String],
        min_sequence_score: f64,
    ) -> Result<Vec<Sequence>>
    where
        G: ContextGenerator<T>,
        V: SequenceValidator<T>,
    {
        if min_sequence_score.is_nan() {
            return Err(Error::invalid_config("minimum sequence score is NaN"));
        }
        let mut prev = BoundedFrontier::new(self.beam_size)?;
        let mut next = BoundedFrontier::new(self.beam_size)?;
        prev.insert(Sequence::empty());

        for i in 0..sequence.len() {
            let sz = prev.len().min(self.beam_size);
            for _ in 0..sz {
                let top = prev.extract_best()?;
                let context =
                    self.context_generator.context(i, sequence, top.outcomes(), additional)?;
                let scores = self.scores(context)?;
                let Some(cutoff) = threshold(&scores, self.beam_size) else {
                    continue;
                };
                for (l, &p) in scores.iter().enumerate() {
                    if p >= cutoff {
                        self.advance(i, sequence, &top, l, p, min_sequence_score, &mut next)?;
                    }
                }
                if next.is_empty() {
                    trace!("position {i}: no survivors above threshold, trying all outcomes");
                    for (l, &p) in scores.iter().enumerate() {
                        self.advance(i, sequence, &top, l, p, min_sequence_score, &mut next)?;
                    }
                }
            }
            trace!("position {i}: {} hypotheses survive", next.len());
            prev.clear();
            std::mem::swap(&mut prev, &mut next);
        }

        let n = num_sequences.min(prev.len());
        let mut results = Vec::with_capacity(n);
        for _ in 0..n {
            results.push(prev.extract_best()?);
        }
        debug!(
            "decoded {} positions into {} sequences (cache hits={}, misses={})",
            sequence.len(),
            results.len(),
            self.cache.hits(),
            self.cache.misses()
        );
        Ok(results)
    }

    fn scores(&mut self, context: Vec<String>) -> Result<Scores> {
        if let Some(scores) = self.cache.get(&context) {
            return Ok(scores);
        }
        let scores = self.model.evaluate(&context)?;
        let expected = self.model.outcome_count();
        if scores.len() != expected {
            return Err(Error::OutcomeMismatch { expected, actual: scores.len() });
        }
        let scores: Scores = scores.into();
        self.cache.put(context, scores.clone());
        Ok(scores)
    }

    #[allow(clippy::too_many_arguments)]
    fn advance<T>(
        &self,
        index: usize,
        sequence: &[T],
        top: &Sequence,
        outcome: usize,
        prob: f64,
        min_sequence_score: f64,
        next: &mut BoundedFrontier<Sequence>,
    ) -> Result<()>
    where
        V: SequenceValidator<T>,
    {
        let name = self.model.outcome_name(outcome).ok_or(Error::UnknownOutcome(outcome))?;
        if self.validator.valid(index, sequence, top.outcomes(), name) {
            let ns = top.extend(name, prob);
            if ns.score() > min_sequence_score {
                next.insert(ns);
            }
        }
        Ok(())
    }
}

/// Lowest score still among the top `beam_size` outcomes.
fn threshold(scores: &[f64], beam_size: usize) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted[sorted.len().saturating_sub(beam_size)])
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Scores depend only on the previous outcome.
    struct Bigram {
        labels: Vec<String>,
        table: Vec<Vec<f64>>,
        calls: Cell<usize>,
    }

    impl Bigram {
        fn new(labels: &[&str], table: Vec<Vec<f64>>) -> Self {
            Self {
                labels: labels.iter().map(|s| s.to_string()).collect(),
                table,
                calls: Cell::new(0),
            }
        }
    }

    impl ScoringModel for Bigram {
        fn evaluate(&self, context: &[String]) -> Result<Vec<f64>> {
            self.calls.set(self.calls.get() + 1);
            let row = match context[0].strip_prefix("prev=") {
                Some(prev) => self.labels.iter().position(|l| l == prev).map_or(0, |i| i + 1),
                None => 0,
            };
            Ok(self.table[row].clone())
        }

        fn outcome_count(&self) -> usize {
            self.labels.len()
        }

        fn outcome_name(&self, index: usize) -> Option<&str> {
            self.labels.get(index).map(String::as_str)
        }
    }

    fn prev_context(_: usize, _: &[&str], prior: &[String], _: &[String]) -> Result<Vec<String>> {
        Ok(vec![prior.last().map_or("bos".to_string(), |p| format!("prev={p}"))])
    }

    type Ctx = fn(usize, &[&str], &[String], &[String]) -> Result<Vec<String>>;

    fn engine(model: &Bigram, beam_size: usize) -> BeamSearch<&Bigram, Ctx> {
        BeamSearch::new(model, prev_context as Ctx, &BeamConfig::with_beam_size(beam_size)).unwrap()
    }

    #[test]
    fn threshold_picks_kth_best() {
        assert_eq!(threshold(&[0.1, 0.5, 0.4], 2), Some(0.4));
        assert_eq!(threshold(&[0.1, 0.5, 0.4], 5), Some(0.1));
        assert_eq!(threshold(&[], 2), None);
    }

    #[test]
    fn rejects_zero_beam() {
        let model = Bigram::new(&["a"], vec![vec![1.0]; 2]);
        let ret = BeamSearch::new(&model, prev_context as Ctx, &BeamConfig::with_beam_size(0));
        assert!(matches!(ret, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn wider_beam_recovers_garden_path() {
        // Greedy picks "a" first, but "b" then "b" is far more likely overall.
        let model = Bigram::new(
            &["a", "b"],
            vec![vec![0.6, 0.4], vec![0.5, 0.5], vec![0.01, 0.99]],
        );
        let input = ["x", "y"];
        let greedy = engine(&model, 1).best_sequence(&input, &[]).unwrap().unwrap();
        assert_eq!(greedy.outcomes()[0], "a");
        let wide = engine(&model, 2).best_sequence(&input, &[]).unwrap().unwrap();
        assert_eq!(wide.outcomes(), ["b", "b"]);
        assert!(wide.score() > greedy.score());
    }

    #[test]
    fn fallback_keeps_search_alive() {
        // "a" dominates but is never valid; beam 1 would otherwise prune everything.
        let model = Bigram::new(&["a", "b"], vec![vec![0.9, 0.1]; 3]);
        let not_a = |_: usize, _: &[&str], _: &[String], o: &str| o != "a";
        let mut search = engine(&model, 1).with_validator(not_a);
        let best = search.best_sequence(&["x", "y", "z"], &[]).unwrap().unwrap();
        assert_eq!(best.outcomes(), ["b", "b", "b"]);
    }

    #[test]
    fn fallback_is_per_parent() {
        let model = Bigram::new(
            &["a", "b", "c", "d"],
            vec![
                vec![0.5, 0.3, 0.15, 0.05],
                vec![0.3, 0.3, 0.3, 0.1],
                vec![0.3, 0.3, 0.3, 0.1],
                vec![0.3, 0.3, 0.3, 0.1],
                vec![0.25; 4],
            ],
        );
        // After "b" only "a" may follow, after "a" or "c" only "d", which is
        // never among the top three.
        let only = |_: usize, _: &[&str], prior: &[String], o: &str| match prior.last() {
            None => true,
            Some(p) if p == "b" => o == "a",
            Some(_) => o == "d",
        };
        let mut search = engine(&model, 3).with_validator(only);
        let results = search.best_sequences(5, &["x", "y"], &[], f64::NEG_INFINITY).unwrap();
        let outcomes: Vec<_> = results.iter().map(|s| s.outcomes().join(" ")).collect();
        // "a" is expanded first into an empty frontier and falls back to "a d";
        // "c" comes last, finds survivors and is not retried.
        assert_eq!(outcomes, ["b a", "a d"]);
        assert!((results[1].score() - (0.5_f64.ln() + 0.1_f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn nan_min_score_is_rejected() {
        let model = Bigram::new(&["a", "b"], vec![vec![0.5, 0.5]; 3]);
        let ret = engine(&model, 2).best_sequences(5, &["x", "y"], &[], f64::NAN);
        assert!(matches!(ret, Err(Error::InvalidConfiguration(_))));
        assert_eq!(model.calls.get(), 0);
    }

    #[test]
    fn min_score_prunes() {
        let model = Bigram::new(&["a", "b"], vec![vec![0.5, 0.5]; 3]);
        let mut search = engine(&model, 2);
        let floor = 2.0 * 0.5_f64.ln() + 1e-9;
        let results = search.best_sequences(4, &["x", "y"], &[], floor).unwrap();
        assert!(results.is_empty());
        assert!(search.best_sequence(&["x"], &[]).unwrap().is_some());
    }

    #[test]
    fn score_vector_length_is_checked() {
        let model = Bigram::new(&["a", "b"], vec![vec![1.0]; 3]);
        let ret = engine(&model, 2).best_sequence(&["x"], &[]);
        assert!(matches!(ret, Err(Error::OutcomeMismatch { expected: 2, actual: 1 })));
    }

    #[test]
    fn collaborator_errors_propagate() {
        let model = Bigram::new(&["a"], vec![vec![1.0]; 2]);
        let failing = |_: usize, _: &[&str], _: &[String], _: &[String]| -> Result<Vec<String>> {
            Err(Error::collaborator("malformed context"))
        };
        let mut search = BeamSearch::new(&model, failing, &BeamConfig::default()).unwrap();
        let ret = search.best_sequence(&["x"], &[]);
        assert!(matches!(ret, Err(Error::Collaborator(_))));
        assert_eq!(model.calls.get(), 0);
    }

    #[test]
    fn cache_avoids_repeat_evaluations() {
        let model = Bigram::new(&["a", "b"], vec![vec![0.7, 0.3], vec![0.6, 0.4], vec![0.2, 0.8]]);
        let config = BeamConfig::with_beam_size(2).cache_size(16);
        let mut search = BeamSearch::new(&model, prev_context as Ctx, &config).unwrap();
        let first = search.best_sequences(2, &["x"; 6], &[], f64::NEG_INFINITY).unwrap();
        let calls = model.calls.get();
        // bos, prev=a and prev=b are the only distinct contexts
        assert_eq!(calls, 3);
        let second = search.best_sequences(2, &["x"; 6], &[], f64::NEG_INFINITY).unwrap();
        assert_eq!(model.calls.get(), calls);
        let scores = |v: &[Sequence]| v.iter().map(|s| s.score().to_bits()).collect::<Vec<_>>();
        assert_eq!(scores(&first), scores(&second));
        assert!(search.cache().hits() > 0);
    }
}
