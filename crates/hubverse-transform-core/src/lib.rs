//! Core library for transforming hub model-output files.
//!
//! When a model-output file lands under the origin prefix of a bucket, this
//! crate turns it into a Parquet file the rest of the hub can query:
//!
//! - The object key and file name are validated and split into a destination
//!   directory, a round id, a team and a model (`handler` module).
//! - CSV input is streamed and decoded with an inferred schema; Parquet input
//!   is read through a random-access handle (`formats` module).
//! - `round_id`, `team` and `model` columns are appended to every row
//!   (`table` module).
//! - The result is written as `{destination}/{name}.parquet` back into the
//!   same bucket, through an object-store accessor that can target S3, a
//!   local directory or memory (`storage` module).
//! - S3 notifications are decoded and filtered before a transform is started
//!   (`trigger` module).
#![deny(missing_docs)]
pub mod config;
pub mod error;
pub mod formats;
pub mod handler;
pub mod storage;
pub mod table;
pub mod trigger;

pub use config::{BackendKind, TransformConfig};
pub use error::{TransformError, TransformResult};
pub use handler::{FileType, ModelOutputFileName, ModelOutputHandler, ObjectKeyParts};
pub use storage::{FileSystem, StorageBackend, StorageError};
pub use table::ModelOutputTable;
pub use trigger::{ObjectCreated, SkipFilter, SkipReason, TransformedFile, TriggerError};
