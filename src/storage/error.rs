use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure codes a binding can observe from the blob store client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageErrorCode {
    Unknown,
    ObjectNotFound,
    Unauthorized,
    Canceled,
    RetryLimitExceeded,
}

impl StorageErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageErrorCode::Unknown => "storage/unknown",
            StorageErrorCode::ObjectNotFound => "storage/object-not-found",
            StorageErrorCode::Unauthorized => "storage/unauthorized",
            StorageErrorCode::Canceled => "storage/canceled",
            StorageErrorCode::RetryLimitExceeded => "storage/retry-limit-exceeded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError {
    pub code: StorageErrorCode,
    message: String,
}

impl StorageError {
    pub fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for StorageError {}

pub type StorageResult<T> = Result<T, StorageError>;

pub fn object_not_found(message: impl Into<String>) -> StorageError {
    StorageError::new(StorageErrorCode::ObjectNotFound, message)
}

pub fn unauthorized(message: impl Into<String>) -> StorageError {
    StorageError::new(StorageErrorCode::Unauthorized, message)
}

pub fn unknown_error(message: impl Into<String>) -> StorageError {
    StorageError::new(StorageErrorCode::Unknown, message)
}
