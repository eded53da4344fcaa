//! Error types and SNAFU context selectors for model-output transforms.
//!
//! `TransformError` is the single error surfaced by [`crate::handler`]. Key and
//! filename validation errors are raised at construction time; the remaining
//! variants wrap failures from storage and from the Arrow/Parquet codecs.

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use snafu::prelude::*;

use crate::storage::StorageError;

/// Result alias for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors from validating and transforming a model-output file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransformError {
    /// The object key does not start with the configured origin segment.
    #[snafu(display("Object key {key} does not start with {origin_prefix}"))]
    PathPrefix {
        /// The rejected key.
        key: String,
        /// Origin segment the key was expected to start with.
        origin_prefix: String,
    },

    /// The object key holds an empty, `.` or `..` segment, which cannot be
    /// addressed as an object path.
    #[snafu(display("Malformed object key {key}: {reason}"))]
    KeyFormat {
        /// The rejected key.
        key: String,
        /// Which segment rule the key broke.
        reason: String,
    },

    /// The object's extension is not a supported model-output encoding.
    #[snafu(display("Unsupported file type: {extension:?} in {key}"))]
    UnsupportedFileType {
        /// The rejected key.
        key: String,
        /// Extension found on the key, including the leading dot (may be empty).
        extension: String,
    },

    /// The base name does not decompose into round id, team and model.
    #[snafu(display("Unexpected model-output file name format: {file_name} ({reason})"))]
    FilenameFormat {
        /// Base name (without extension) that failed to parse.
        file_name: String,
        /// Which rule the name broke.
        reason: String,
    },

    /// Reading or writing the underlying object failed.
    #[snafu(display("Storage error: {source}"))]
    Storage {
        /// Underlying storage error.
        #[snafu(source, backtrace)]
        source: StorageError,
    },

    /// The delimited-text input could not be decoded.
    #[snafu(display("Failed to read CSV {address}: {source}"))]
    CsvRead {
        /// Address of the input object.
        address: String,
        /// Underlying Arrow CSV error.
        source: ArrowError,
    },

    /// The Parquet input could not be decoded.
    #[snafu(display("Failed to read Parquet {address}: {source}"))]
    ParquetRead {
        /// Address of the input object.
        address: String,
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// The Parquet output could not be encoded or uploaded.
    #[snafu(display("Failed to write Parquet {address}: {source}"))]
    ParquetWrite {
        /// Address of the output object.
        address: String,
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// Building the augmented record batches failed.
    #[snafu(display("Arrow error while adding metadata columns: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },
}
