use std::{error::Error, fmt};

use snafu::{Backtrace, prelude::*};

/// Errors produced by the object store behind a [`crate::storage::FileSystem`].
///
/// Backend-specific failures are wrapped in this enum so higher layers can map
/// them into `StorageError` variants with additional context.
#[derive(Debug)]
pub enum BackendError {
    /// An error reported by the `object_store` client.
    ObjectStore(object_store::Error),
    /// An object path that the store refused to parse.
    Path(object_store::path::Error),
    /// An I/O error raised outside the object store client (local directory
    /// setup, buffered upload completion).
    Io(std::io::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ObjectStore(e) => write!(f, "object store error: {e}"),
            BackendError::Path(e) => write!(f, "invalid object path: {e}"),
            BackendError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::ObjectStore(e) => Some(e),
            BackendError::Path(e) => Some(e),
            BackendError::Io(e) => Some(e),
        }
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// The addressed object does not exist.
    #[snafu(display("Object not found: {address}"))]
    NotFound {
        /// `{container}/{path}` address of the missing object.
        address: String,
        /// Underlying backend error that caused the failure.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// An address did not name an object inside this accessor's container.
    #[snafu(display("Invalid object address {address}: {reason}"))]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// Why the address was rejected.
        reason: String,
    },

    /// An object path was rejected by the backend path parser.
    #[snafu(display("Invalid object path {address}: {source}"))]
    InvalidPath {
        /// The rejected address.
        address: String,
        /// Underlying path parse error.
        source: BackendError,
    },

    /// The object store client could not be constructed.
    #[snafu(display("Failed to build {backend} storage client for {container}: {source}"))]
    Build {
        /// Backend name (for example `s3` or `local`).
        backend: String,
        /// Container the client was being built for.
        container: String,
        /// Underlying backend error.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The region hosting a bucket could not be resolved.
    ///
    /// Callers recover from this with a configured default region.
    #[snafu(display("Failed to resolve region for bucket {bucket}: {source}"))]
    RegionResolution {
        /// Bucket whose region lookup failed.
        bucket: String,
        /// Underlying backend error.
        source: BackendError,
    },

    /// Any other read or write failure reported by the backend.
    #[snafu(display("Storage I/O error at {address}: {source}"))]
    OtherIo {
        /// `{container}/{path}` address where the failure occurred.
        address: String,
        /// Underlying backend error with backend-specific details.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}

impl StorageError {
    /// Classify an `object_store` error raised while touching `address`.
    pub(crate) fn from_object_store(address: &str, err: object_store::Error) -> Self {
        let address = address.to_string();
        match err {
            e @ object_store::Error::NotFound { .. } => StorageError::NotFound {
                address,
                source: BackendError::ObjectStore(e),
                backtrace: Backtrace::capture(),
            },
            e => StorageError::OtherIo {
                address,
                source: BackendError::ObjectStore(e),
                backtrace: Backtrace::capture(),
            },
        }
    }
}
