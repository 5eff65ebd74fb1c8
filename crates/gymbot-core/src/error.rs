//! Error taxonomy for the core library.

use crate::shared::Category;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Token outside the closed action vocabulary or with a malformed layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("unknown {field} value: {value}")]
    BadValue { field: &'static str, value: String },

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Errors that can occur in the profile and catalog stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("profile not found: {0}")]
    NotFound(String),

    #[error("no workout to attach feedback to for user {0}")]
    NoWorkout(String),

    #[error("feedback already recorded on the latest workout for user {0}")]
    FeedbackAlreadySet(String),

    #[error("store call timed out after {0} ms")]
    Timeout(u64),

    #[error("store worker failed: {0}")]
    Worker(String),
}

impl StoreError {
    /// Failures that may succeed on a later attempt (I/O, timeout).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Sled(_) | Self::Timeout(_) | Self::Worker(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RoutineError {
    #[error("no exercises for {category:?} in this environment")]
    Empty { category: Category },

    #[error("catalog failure: {0}")]
    Store(#[from] StoreError),
}

/// Internal dialog failures; each one maps to a recovery screen, never to a crash.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("profile missing for user {0}")]
    ProfileMissing(String),

    #[error("invalid token: {0}")]
    InvalidToken(#[from] CodecError),

    #[error("transient failure: {0}")]
    Transient(String),
}

impl From<StoreError> for DialogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(user_id) => Self::ProfileMissing(user_id),
            other => Self::Transient(other.to_string()),
        }
    }
}
