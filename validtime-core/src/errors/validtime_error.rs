use super::StorageError;

/// Top-level error type for valid-time operations.
/// Storage errors convert into this via `From`.
#[derive(Debug, thiserror::Error)]
pub enum ValidtimeError {
    /// Malformed interval or value text.
    #[error("format error: {0}")]
    Format(String),

    /// Boundary arithmetic or a parsed value left the representable range.
    #[error("value out of range: cannot {operation} {value}")]
    OutOfRange { operation: String, value: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported lookup: {lookup}")]
    UnsupportedLookup { lookup: String },

    /// Snapshot header or row shape does not match.
    #[error("malformed input at line {line}: {message}")]
    MalformedInput { line: u64, message: String },

    #[error("operation {operation} needs bounds, interval is empty")]
    EmptyInterval { operation: String },

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("merge callback failed: {0}")]
    Callback(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ValidtimeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Format(_) => "FORMAT_ERROR",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::UnsupportedLookup { .. } => "UNSUPPORTED_LOOKUP",
            Self::MalformedInput { .. } => "MALFORMED_INPUT",
            Self::EmptyInterval { .. } => "EMPTY_INTERVAL",
            Self::StorageError(e) => e.error_code(),
            Self::Callback(_) => "CALLBACK_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// True when the storage backend rejected a write on a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::StorageError(StorageError::ConstraintViolation { .. })
        )
    }
}

/// Convenience type alias.
pub type ValidtimeResult<T> = Result<T, ValidtimeError>;
