use thiserror::Error;

pub type AppResult<T> = core::result::Result<T, AppError>;
pub type ApiResult<T> = core::result::Result<T, ApiError>;

/// Failures talking to the todo backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("server issued a malformed token")]
    InvalidToken,
    #[error("not logged in")]
    NotAuthenticated,
}

impl ApiError {
    /// Transport failures and 5xx responses are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
}
