use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sequences scoring at or below this are pruned unless the caller asks otherwise.
pub const DEFAULT_MIN_SEQUENCE_SCORE: f64 = -100_000.0;

/// Beam search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    /// Hypotheses kept per position, and outcomes considered per hypothesis.
    pub beam_size: usize,
    /// Entries in the evaluation cache; 0 disables it.
    pub cache_size: usize,
    pub min_sequence_score: f64,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self { beam_size: 3, cache_size: 0, min_sequence_score: DEFAULT_MIN_SEQUENCE_SCORE }
    }
}

impl BeamConfig {
    pub fn with_beam_size(beam_size: usize) -> Self {
        Self { beam_size, ..Default::default() }
    }

    #[must_use]
    pub fn cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.beam_size < 1 {
            return Err(Error::invalid_config(format!(
                "beam size must be at least 1, got {}",
                self.beam_size
            )));
        }
        if self.min_sequence_score.is_nan() {
            return Err(Error::invalid_config("minimum sequence score is NaN"));
        }
        Ok(())
    }
}
