//! Error types for rowpage.

use thiserror::Error;

/// The main error type for plan translation.
#[derive(Debug, Error)]
pub enum RowPageError {
    /// The plan has a shape the row-number emulation cannot express.
    #[error("Unsupported construct: {0}")]
    Unsupported(String),

    /// An expression references a column that is not in scope.
    #[error("Column [{table}].[{column}] is not visible at this point of the plan")]
    ColumnOutOfScope { table: String, column: String },

    /// A skip/take bound is not a non-negative integer.
    #[error("Invalid paging bound '{name}': {message}")]
    InvalidBound { name: String, message: String },

    /// The requested paging strategy is handled elsewhere.
    #[error("Paging strategy '{0}' is not handled by the row-number translator")]
    UnsupportedStrategy(String),

    /// Internal defect, the translation is abandoned.
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Plan file could not be decoded.
    #[error("Plan decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RowPageError {
    /// Create an unsupported-construct error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Create an invariant violation.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    /// Create an invalid bound error for the named slot.
    pub fn bound(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidBound {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for rowpage operations.
pub type RowPageResult<T> = Result<T, RowPageError>;
