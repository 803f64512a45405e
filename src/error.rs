use crate::types::WorkoutId;

/// Everything the workout model and store can fail with.
///
/// None of these are fatal: a declined `create` or a failed lookup leaves the
/// store exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum WorkoutError {
    /// Caller input outside the accepted range.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A derived metric could not be computed from the base fields.
    #[error("cannot compute {0}")]
    InvalidMetric(&'static str),

    /// Every id up to `u64::MAX` is taken; nothing new can be recorded.
    #[error("no workout ids left")]
    IdsExhausted,

    #[error("workout not found: {id}")]
    NotFound { id: WorkoutId },

    /// Persisted data exists but does not describe a valid workout list.
    #[error("corrupt persisted state: {0}")]
    CorruptState(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorkoutError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkoutError>;
