//! Error types shared by the HTTP record store implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`HttpStoreError`] failures.
pub type HttpStoreResult<T> = Result<T, HttpStoreError>;

/// Failures that can occur while talking to the remote record store.
#[derive(Debug, Error)]
pub enum HttpStoreError {
    /// Required environment variable is missing.
    #[error("missing record store environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build record store client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// No bearer credential is configured.
    #[error("record store credential is missing")]
    MissingCredential,
    /// A request to a record endpoint could not be sent.
    #[error("failed to send record store request for `{key}`")]
    RequestSend {
        key: String,
        #[source]
        source: reqwest::Error,
    },
    /// The store returned an unexpected status code.
    #[error("unexpected record store status {status} for `{key}`")]
    RequestStatus {
        key: String,
        status: StatusCode,
        body: String,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode record store response for `{key}`")]
    DecodeResponse {
        key: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<HttpStoreError> for StorageError {
    fn from(err: HttpStoreError) -> Self {
        match err {
            HttpStoreError::MissingCredential => StorageError::MissingCredential,
            HttpStoreError::RequestStatus { key, status, body } => StorageError::Status {
                key,
                status: status.as_u16(),
                body,
            },
            HttpStoreError::DecodeResponse { key, source } => {
                StorageError::malformed(key, source.to_string())
            }
            HttpStoreError::RequestSend { ref key, .. } => {
                let key = key.clone();
                StorageError::unavailable(key, "request failed", err)
            }
            other @ (HttpStoreError::MissingEnvVar { .. }
            | HttpStoreError::ClientBuilder { .. }) => {
                StorageError::unavailable("", "record store misconfigured", other)
            }
        }
    }
}
