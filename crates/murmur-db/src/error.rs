use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("column `{0}` missing from result set")]
    MissingColumn(String),

    #[error("column `{column}` could not be decoded: {reason}")]
    Decode { column: String, reason: String },

    /// The blocking task running the statement panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(String),
}
