use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by record store backends regardless of the transport.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No bearer credential is configured; no request was sent.
    #[error("record store credential is missing")]
    MissingCredential,
    /// The store answered with a non-success status other than 404.
    #[error("record store rejected `{key}` with status {status}: {body}")]
    Status {
        key: String,
        status: u16,
        body: String,
    },
    /// The store could not be reached or the exchange broke mid-way.
    #[error("record store unavailable for `{key}`: {message}")]
    Unavailable {
        key: String,
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The stored value does not have the expected shape.
    #[error("malformed record `{key}`: {reason}")]
    Malformed { key: String, reason: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(
        key: impl Into<String>,
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::Unavailable {
            key: key.into(),
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Construct a malformed-record error.
    pub fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::Malformed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Transient faults are worth another attempt: unreachable store, server
    /// errors and throttling. Client errors, missing credentials and malformed
    /// payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Status { status, .. } => *status >= 500 || *status == 429,
            StorageError::Unavailable { .. } => true,
            StorageError::MissingCredential | StorageError::Malformed { .. } => false,
        }
    }
}
