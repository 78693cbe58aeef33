use thiserror::Error;

/// Boxed error raised by a scoring model or a context generator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("frontier is empty")]
    EmptyFrontier,
    #[error("model returned {actual} scores for {expected} outcomes")]
    OutcomeMismatch { expected: usize, actual: usize },
    #[error("model has no name for outcome {0}")]
    UnknownOutcome(usize),
    #[error(transparent)]
    Collaborator(BoxError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Wraps an arbitrary collaborator failure so it can cross the engine unchanged.
    pub fn collaborator<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Collaborator(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
