//! Error handling primitives shared across the core.
//!
//! Zero-denominator metrics are not errors; they surface as undefined
//! `MetricValue`s. Only caller mistakes and collaborator failures land here.

use thiserror::Error;

/// Stable error codes handed to the transport layer.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Request failed validation.
    InvalidInput = 1,
    /// Selector not present in the protected-attribute registry.
    UnknownSelector = 2,
    /// Feature not present in the evaluation schema.
    UnknownFeature = 3,
    /// Metric name outside the supported vocabulary.
    UnknownMetric = 4,
    /// The re-scoring collaborator failed.
    ScoringFailed = 5,
    /// Catch-all for IO problems and bugs.
    Internal = 6,
}

impl ErrorCode {
    /// HTTP status the transport layer should answer with.
    pub const fn http_status(self) -> u16 {
        match self {
            ErrorCode::Ok => 200,
            ErrorCode::InvalidInput
            | ErrorCode::UnknownSelector
            | ErrorCode::UnknownFeature
            | ErrorCode::UnknownMetric => 400,
            ErrorCode::ScoringFailed | ErrorCode::Internal => 500,
        }
    }
}

/// Canonical error type for the core.
#[derive(Error, Debug)]
pub enum FairError {
    #[error("unknown protected attribute '{0}'")]
    UnknownSelector(String),

    #[error("at most two protected attributes can be combined, got {0}")]
    TooManySelectors(usize),

    #[error("feature '{0}' not found")]
    UnknownFeature(String),

    #[error("unsupported metric '{0}'")]
    UnknownMetric(String),

    #[error("unknown rate component '{0}', expected 'tpr' or 'fpr'")]
    UnknownComponent(String),

    #[error("threshold {0} outside [0, 1]")]
    InvalidThreshold(f64),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("row {row} is missing feature '{column}'")]
    MissingFeature { row: usize, column: String },

    #[error("scoring failed: {0}")]
    Scoring(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type FairResult<T> = Result<T, FairError>;

impl FairError {
    /// Validation helper.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Machine parsable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            FairError::UnknownSelector(_) => ErrorCode::UnknownSelector,
            FairError::UnknownFeature(_) => ErrorCode::UnknownFeature,
            FairError::UnknownMetric(_) => ErrorCode::UnknownMetric,
            FairError::TooManySelectors(_)
            | FairError::UnknownComponent(_)
            | FairError::InvalidThreshold(_)
            | FairError::InvalidInput(_)
            | FairError::MissingFeature { .. } => ErrorCode::InvalidInput,
            FairError::Scoring(_) => ErrorCode::ScoringFailed,
            FairError::Io(_) | FairError::Json(_) => ErrorCode::Internal,
        }
    }
}
