//! Beam search decoding of label sequences.
//!
//! [`BeamSearch`] finds the most probable labellings of an input against any
//! [`ScoringModel`], using a [`ContextGenerator`] to derive features for each
//! position and an optional [`SequenceValidator`] to forbid transitions.

pub mod beam;
pub mod context;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod quark;
pub mod validator;

pub use beam::{BeamConfig, BeamSearch, BoundedFrontier, EvaluationCache, Sequence};
pub use context::{ItemContextGenerator, WordContextGenerator};
pub use dataset::{Dataset, Instance};
pub use error::{Error, Result};
pub use evaluation::{Estimation, Evaluation};
pub use model::{AcceptAll, ContextGenerator, LinearModel, ScoringModel, SequenceValidator};
pub use validator::BioValidator;
