use thiserror::Error;

/// Errors raised while validating inputs or moving data across the I/O boundary.
///
/// Numerically degenerate inputs (zero emissions, unchanged values) are never
/// errors; the decomposition absorbs them.
#[derive(Debug, Error)]
pub enum LmdiError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid year range {start}-{end}: {reason}")]
    InvalidRange {
        start: i32,
        end: i32,
        reason: &'static str,
    },

    #[error("insufficient data: need at least 2 years in range, found {found}")]
    InsufficientData { found: usize },

    #[error("year {0} appears more than once in the input")]
    DuplicateYear(i32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LmdiError>;
