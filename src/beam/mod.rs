//! Bounded-width beam search over label sequences.

pub mod cache;
pub mod config;
pub mod frontier;
pub mod search;
pub mod sequence;

pub use cache::EvaluationCache;
pub use config::{BeamConfig, DEFAULT_MIN_SEQUENCE_SCORE};
pub use frontier::{BoundedFrontier, Ranked};
pub use search::BeamSearch;
pub use sequence::Sequence;
