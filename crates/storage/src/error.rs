/// All errors that can be returned by a `RequestStore` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// No record with the given id.
    #[error("request not found: {id}")]
    NotFound { id: String },

    /// An insert collided with an existing id.
    #[error("request already exists: {id}")]
    AlreadyExists { id: String },

    /// Optimistic-concurrency conflict — the record's version moved since the
    /// caller loaded it. The caller must reload and retry.
    #[error("version conflict on request {id}: expected version {expected}")]
    VersionConflict { id: String, expected: i64 },

    /// A backend-specific fault (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
