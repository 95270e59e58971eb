use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlurError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("buffer holds {actual} samples, expected {expected}")]
    InvalidBuffer { expected: usize, actual: usize },
    #[error("buffer index out of range: {0}")]
    OutOfRange(String),
    #[error("worker for partition {partition} failed: {message}")]
    WorkerFailure { partition: usize, message: String },
    /// A worker stopped early because a sibling in the same iteration failed.
    #[error("worker aborted after a sibling failure")]
    Aborted,
}
