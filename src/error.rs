use std::fmt;

use serde::Serialize;
use ts_rs::TS;

/// Structured error type for the command pipeline. Step handlers return it,
/// the batch executor folds it into an `ExecutionResult`, and only the
/// terminal variants ever reach the caller of the model router.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "code", content = "detail")]
#[ts(export)]
pub enum AppError {
    NotFound { what: String },
    InvalidIndex { what: String, index: usize },
    ValidationError { message: String },
    SampleNotFound { query: String },
    Unauthorized { message: String },
    RateLimited { message: String },
    ApiError { message: String },
    IoError { message: String },
    StepPanicked { message: String },
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound { what: what.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    /// The `code` tag this error serializes under.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "NotFound",
            AppError::InvalidIndex { .. } => "InvalidIndex",
            AppError::ValidationError { .. } => "ValidationError",
            AppError::SampleNotFound { .. } => "SampleNotFound",
            AppError::Unauthorized { .. } => "Unauthorized",
            AppError::RateLimited { .. } => "RateLimited",
            AppError::ApiError { .. } => "ApiError",
            AppError::IoError { .. } => "IoError",
            AppError::StepPanicked { .. } => "StepPanicked",
        }
    }

    /// Auth and quota failures from the upstream model. These are the only
    /// errors that surface to the end caller as hard failures.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppError::Unauthorized { .. } | AppError::RateLimited { .. })
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound { what } => write!(f, "{what} not found"),
            AppError::InvalidIndex { what, index } => {
                write!(f, "Invalid {what} index: {index}")
            }
            AppError::ValidationError { message } => write!(f, "{message}"),
            AppError::SampleNotFound { query } => write!(f, "No sample found for \"{query}\""),
            AppError::Unauthorized { message } => write!(f, "Not authorized: {message}"),
            AppError::RateLimited { message } => write!(f, "Rate limited: {message}"),
            AppError::ApiError { message } => write!(f, "API error: {message}"),
            AppError::IoError { message } => write!(f, "I/O error: {message}"),
            AppError::StepPanicked { message } => {
                write!(f, "Unexpected failure while executing step: {message}")
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::IoError {
            message: e.to_string(),
        }
    }
}

impl From<crate::storage::StorageError> for AppError {
    fn from(e: crate::storage::StorageError) -> Self {
        match e {
            crate::storage::StorageError::Io(io_err) => AppError::IoError {
                message: io_err.to_string(),
            },
            crate::storage::StorageError::Json(json_err) => AppError::ValidationError {
                message: json_err.to_string(),
            },
        }
    }
}

impl From<AppError> for String {
    fn from(e: AppError) -> String {
        e.to_string()
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::ValidationError { message: s }
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::ValidationError {
            message: s.to_string(),
        }
    }
}
