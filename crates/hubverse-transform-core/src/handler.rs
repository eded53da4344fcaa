//! The model-output transform handler.
//!
//! A [`ModelOutputHandler`] is built for exactly one uploaded object. Building
//! it validates the object key and file name; [`ModelOutputHandler::transform`]
//! then reads the file, appends `round_id`, `team` and `model` columns, and
//! writes the result as Parquet next to the original path with the origin
//! segment removed:
//!
//! ```text
//! raw/prefix1/prefix2/2420-01-01-teamA-model1.csv
//!     -> prefix1/prefix2/2420-01-01-teamA-model1.parquet
//! ```

mod file_name;
mod key;

use std::fmt;

use log::info;
use snafu::ResultExt;

pub use file_name::{MAX_SEPARATORS, ModelOutputFileName, SEPARATOR};
pub use key::{FileType, ObjectKeyParts};

use crate::{
    config::{BackendKind, TransformConfig},
    error::{ArrowSnafu, StorageSnafu, TransformResult},
    formats::{
        csv::read_csv,
        parquet::{read_parquet, write_parquet},
    },
    storage::{FileSystem, PARQUET_CONTENT_TYPE, StorageBackend, resolve_region},
    table::ModelOutputTable,
    trigger::TransformedFile,
};

/// Names of the metadata columns appended to every transformed table.
pub const METADATA_COLUMNS: [&str; 3] = ["round_id", "team", "model"];

/// Transforms one model-output object.
pub struct ModelOutputHandler {
    fs: FileSystem,
    file_path: String,
    origin_prefix: String,
    key_parts: ObjectKeyParts,
    file_name_parts: ModelOutputFileName,
}

impl ModelOutputHandler {
    /// Validate `file_path` and build a handler that reads and writes through `fs`.
    ///
    /// The container is taken from `fs`.
    pub fn new(
        fs: FileSystem,
        file_path: impl Into<String>,
        origin_prefix: impl Into<String>,
    ) -> TransformResult<Self> {
        let file_path = file_path.into();
        let origin_prefix = origin_prefix.into();

        let key_parts = ObjectKeyParts::parse(&file_path, &origin_prefix)?;
        info!("Parsed object key: {key_parts:?}");

        let file_name_parts = ModelOutputFileName::parse(&key_parts.file_name)?;
        info!("Parsed model-output file name: {file_name_parts:?}");

        Ok(Self {
            fs,
            file_path,
            origin_prefix,
            key_parts,
            file_name_parts,
        })
    }

    /// Build a handler for an object in an S3 bucket.
    ///
    /// The bucket's region is resolved unless `config.region` is set; a
    /// failed lookup falls back to `config.default_region`.
    pub async fn from_s3(
        bucket: &str,
        key: &str,
        config: &TransformConfig,
    ) -> TransformResult<Self> {
        let region = match &config.region {
            Some(region) => region.clone(),
            None => resolve_region(bucket, &config.default_region).await,
        };
        info!("Using region {region} for bucket {bucket}");

        let backend = StorageBackend::S3 {
            region,
            endpoint: config.endpoint.clone(),
            request_timeout: config.request_timeout,
            connect_timeout: config.connect_timeout,
        };
        let fs = FileSystem::new(bucket, backend).context(StorageSnafu)?;
        Self::new(fs, key, config.origin_prefix.as_str())
    }

    /// Build a handler on the backend selected by `config`.
    pub async fn from_config(
        bucket: &str,
        key: &str,
        config: &TransformConfig,
    ) -> TransformResult<Self> {
        match &config.backend {
            BackendKind::S3 => Self::from_s3(bucket, key, config).await,
            BackendKind::Local(root) => {
                let fs = FileSystem::new(bucket, StorageBackend::Local(root.clone()))
                    .context(StorageSnafu)?;
                Self::new(fs, key, config.origin_prefix.as_str())
            }
        }
    }

    /// Container (bucket) holding the object.
    pub fn storage_location(&self) -> &str {
        self.fs.container()
    }

    /// Full object key as received.
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Origin segment the key was validated against.
    pub fn origin_prefix(&self) -> &str {
        &self.origin_prefix
    }

    /// Base name of the object, without extension.
    pub fn file_name(&self) -> &str {
        &self.key_parts.file_name
    }

    /// Encoding of the object.
    pub fn file_type(&self) -> FileType {
        self.key_parts.file_type
    }

    /// Output directory (origin segment stripped, `.` at the root).
    pub fn destination_path(&self) -> &str {
        &self.key_parts.destination_path
    }

    /// All parts derived from the object key.
    pub fn key_parts(&self) -> &ObjectKeyParts {
        &self.key_parts
    }

    /// All parts derived from the file name.
    pub fn file_name_parts(&self) -> &ModelOutputFileName {
        &self.file_name_parts
    }

    /// Round identifier parsed from the file name.
    pub fn round_id(&self) -> &str {
        &self.file_name_parts.round_id
    }

    /// Team identifier parsed from the file name.
    pub fn team(&self) -> &str {
        &self.file_name_parts.team
    }

    /// Model identifier parsed from the file name.
    pub fn model(&self) -> &str {
        &self.file_name_parts.model
    }

    /// Storage accessor the handler reads and writes through.
    pub fn fs(&self) -> &FileSystem {
        &self.fs
    }

    /// Key the transformed Parquet file is written to.
    pub fn output_key(&self) -> String {
        let name = format!("{}.{}", self.file_name(), FileType::Parquet.extension());
        match self.destination_path() {
            "." => name,
            dir => format!("{dir}/{name}"),
        }
    }

    /// Load the object into a table.
    pub async fn read_table(&self) -> TransformResult<ModelOutputTable> {
        let address = self.fs.address(&self.file_path);
        info!("Reading file: {address}");

        match self.file_type() {
            FileType::Csv => {
                let input = self
                    .fs
                    .open_input_stream(&address)
                    .await
                    .context(StorageSnafu)?;
                read_csv(input).await
            }
            FileType::Parquet => {
                let input = self
                    .fs
                    .open_input_file(&address)
                    .await
                    .context(StorageSnafu)?;
                read_parquet(input).await
            }
        }
    }

    /// Return `table` with `round_id`, `team` and `model` columns appended.
    pub fn add_columns(&self, table: &ModelOutputTable) -> TransformResult<ModelOutputTable> {
        info!("Adding columns to table with {} rows", table.num_rows());

        let [round_id, team, model] = METADATA_COLUMNS;
        table
            .with_constant_columns(&[
                (round_id, self.round_id()),
                (team, self.team()),
                (model, self.model()),
            ])
            .context(ArrowSnafu)
    }

    /// Write `table` as Parquet to [`Self::output_key`] in the same container.
    ///
    /// Returns the container and key written.
    pub async fn write_table(&self, table: &ModelOutputTable) -> TransformResult<(String, String)> {
        let key = self.output_key();
        let address = self.fs.address(&key);

        let output = self
            .fs
            .open_output_stream(&address, PARQUET_CONTENT_TYPE)
            .context(StorageSnafu)?;
        write_parquet(table, output).await?;
        info!("Finished writing parquet file: {address}");

        Ok((self.storage_location().to_string(), key))
    }

    /// Read, augment and write the object. Returns the container and key written.
    pub async fn transform(&self) -> TransformResult<(String, String)> {
        let table = self.read_table().await?;
        let table = self.add_columns(&table)?;
        self.write_table(&table).await
    }

    /// Describe a written object by re-querying the store for its content type.
    pub async fn describe_output(&self, key: &str) -> TransformResult<TransformedFile> {
        let content_type = self
            .fs
            .content_type(&self.fs.address(key))
            .await
            .context(StorageSnafu)?;
        Ok(TransformedFile {
            key: key.to_string(),
            content_type,
        })
    }
}

impl fmt::Display for ModelOutputHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handle model-output data transforms for {} in {}.",
            self.file_path,
            self.storage_location()
        )
    }
}

impl fmt::Debug for ModelOutputHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModelOutputHandler('{}', '{}', '{}')",
            self.storage_location(),
            self.file_path,
            self.origin_prefix
        )
    }
}
