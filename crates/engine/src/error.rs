use curio_core::TransitionError;
use curio_storage::StorageError;

/// Every error an engine operation can return.
///
/// All of these are surfaced to the caller; none corrupts the stored record,
/// because the store is only written on full success. Idempotent replays are
/// not errors — they return the previously stored record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The validator refused the edge (`InvalidTransition` or
    /// `NotApplicable`). Recoverable: pick a different action.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The record's version moved between load and write. Recoverable:
    /// reload and retry. The engine never merges concurrent transitions.
    #[error("concurrent modification of request {id}: reload and retry")]
    ConcurrentModification { id: String },

    /// Malformed input: inverted dates, negative amounts, blank references,
    /// unknown artifact or museum.
    #[error("validation error: {0}")]
    Validation(String),

    /// No request with the given id.
    #[error("request not found: {id}")]
    NotFound { id: String },

    /// A backend fault unrelated to this request's state.
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for EngineError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { id } => EngineError::NotFound { id },
            StorageError::VersionConflict { id, .. } => EngineError::ConcurrentModification { id },
            other => EngineError::Storage(other),
        }
    }
}
