//! Storage-layer errors for SQLite operations.

/// Errors raised by the storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    /// A uniqueness, overlap or check constraint rejected a write.
    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("database busy (another writer holds the lock)")]
    Busy,

    #[error("table not found: {table}")]
    TableNotFound { table: String },
}

impl StorageError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } => "STORAGE_ERROR",
            Self::ConstraintViolation { .. } => "CONSTRAINT_VIOLATION",
            Self::Busy => "DB_BUSY",
            Self::TableNotFound { .. } => "TABLE_NOT_FOUND",
        }
    }
}
