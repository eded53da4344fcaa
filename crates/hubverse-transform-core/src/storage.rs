//! Object storage accessor.
//!
//! This module is the only place that talks to a storage backend. A
//! [`FileSystem`] is bound to a single container (an S3 bucket, a
//! sub-directory of a local root, or an in-memory store) and addresses objects
//! with `{container}/{path}` strings, the same shape the transform handler
//! builds from an incoming event.
//!
//! Three access modes are exposed:
//!
//! - sequential streaming reads ([`FileSystem::open_input_stream`]), used for
//!   delimited text;
//! - random-access reads ([`FileSystem::open_input_file`]), used for Parquet,
//!   whose footer has to be read before any row data;
//! - buffered writes ([`FileSystem::open_output_stream`]) that only become
//!   visible once the writer is closed.
//!
//! Backend construction (S3 client options, region lookup) lives here too so
//! higher layers never depend on a specific store.

mod error;
mod input;
mod output;

use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use log::{debug, warn};
use object_store::{
    Attribute, Attributes, ClientOptions, GetOptions, ObjectStore,
    aws::{AmazonS3Builder, resolve_bucket_region},
    local::LocalFileSystem,
    memory::InMemory,
    path::Path as ObjectPath,
};
use snafu::prelude::*;

pub use error::{BackendError, StorageError};
pub(crate) use error::{
    BuildSnafu, InvalidAddressSnafu, InvalidPathSnafu, OtherIoSnafu, RegionResolutionSnafu,
};
pub use input::{InputStream, RandomAccessFile};
pub use output::OutputStream;

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Content type recorded on Parquet objects written through this module.
pub const PARQUET_CONTENT_TYPE: &str = "application/vnd.apache.parquet";

/// Storage backend a [`FileSystem`] is built on.
#[derive(Clone, Debug)]
pub enum StorageBackend {
    /// Amazon S3 (or an S3-compatible endpoint).
    S3 {
        /// Region hosting the bucket.
        region: String,
        /// Optional endpoint override for S3-compatible stores.
        endpoint: Option<String>,
        /// Per-request timeout.
        request_timeout: Duration,
        /// Connection timeout.
        connect_timeout: Duration,
    },
    /// A local directory; each container is a sub-directory of `root`.
    Local(PathBuf),
    /// A process-local in-memory store.
    Memory,
}

impl StorageBackend {
    fn name(&self) -> &'static str {
        match self {
            StorageBackend::S3 { .. } => "s3",
            StorageBackend::Local(_) => "local",
            StorageBackend::Memory => "memory",
        }
    }

    /// Whether the backend persists object attributes such as content type.
    fn keeps_attributes(&self) -> bool {
        match self {
            StorageBackend::S3 { .. } | StorageBackend::Memory => true,
            StorageBackend::Local(_) => false,
        }
    }
}

/// Resolve the region hosting `bucket`, falling back to `default_region`.
///
/// Resolution failures are logged and never surfaced.
pub async fn resolve_region(bucket: &str, default_region: &str) -> String {
    match lookup_region(bucket).await {
        Ok(region) => {
            debug!("Resolved region {region} for bucket {bucket}");
            region
        }
        Err(e) => {
            warn!("{e}; using default region {default_region}");
            default_region.to_string()
        }
    }
}

async fn lookup_region(bucket: &str) -> StorageResult<String> {
    resolve_bucket_region(bucket, &ClientOptions::new())
        .await
        .map_err(BackendError::ObjectStore)
        .context(RegionResolutionSnafu {
            bucket: bucket.to_string(),
        })
}

/// Filesystem-style accessor over one storage container.
#[derive(Clone)]
pub struct FileSystem {
    container: String,
    backend: StorageBackend,
    store: Arc<dyn ObjectStore>,
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("container", &self.container)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl FileSystem {
    /// Build an accessor for `container` on the given backend.
    pub fn new(container: impl Into<String>, backend: StorageBackend) -> StorageResult<Self> {
        let container = container.into();
        let store: Arc<dyn ObjectStore> = match &backend {
            StorageBackend::S3 {
                region,
                endpoint,
                request_timeout,
                connect_timeout,
            } => {
                let options = ClientOptions::new()
                    .with_timeout(*request_timeout)
                    .with_connect_timeout(*connect_timeout);
                let mut builder = AmazonS3Builder::from_env()
                    .with_bucket_name(&container)
                    .with_region(region)
                    .with_client_options(options);
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                let s3 = builder
                    .build()
                    .map_err(BackendError::ObjectStore)
                    .context(BuildSnafu {
                        backend: backend.name(),
                        container: container.clone(),
                    })?;
                Arc::new(s3)
            }
            StorageBackend::Local(root) => {
                let dir = root.join(&container);
                std::fs::create_dir_all(&dir)
                    .map_err(BackendError::Io)
                    .context(BuildSnafu {
                        backend: backend.name(),
                        container: container.clone(),
                    })?;
                let local = LocalFileSystem::new_with_prefix(&dir)
                    .map_err(BackendError::ObjectStore)
                    .context(BuildSnafu {
                        backend: backend.name(),
                        container: container.clone(),
                    })?;
                Arc::new(local)
            }
            StorageBackend::Memory => Arc::new(InMemory::new()),
        };

        Ok(Self {
            container,
            backend,
            store,
        })
    }

    /// Container this accessor is bound to.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Backend this accessor was built on.
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Underlying object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Build the `{container}/{path}` address for a path in this container.
    pub fn address(&self, path: &str) -> String {
        format!("{}/{}", self.container, path)
    }

    /// Split a `{container}/{path}` address into an object path.
    fn object_path(&self, address: &str) -> StorageResult<ObjectPath> {
        let Some(rest) = address
            .strip_prefix(self.container.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return InvalidAddressSnafu {
                address,
                reason: format!("expected an address under container {}", self.container),
            }
            .fail();
        };

        if rest.is_empty() {
            return InvalidAddressSnafu {
                address,
                reason: "object path is empty",
            }
            .fail();
        }

        ObjectPath::parse(rest)
            .map_err(BackendError::Path)
            .context(InvalidPathSnafu { address })
    }

    /// Open an object for sequential reading.
    pub async fn open_input_stream(&self, address: &str) -> StorageResult<InputStream> {
        let path = self.object_path(address)?;
        debug!("Opening input stream: {address}");
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| StorageError::from_object_store(address, e))?;
        Ok(InputStream::new(address, result.into_stream()))
    }

    /// Open an object for random-access reading.
    pub async fn open_input_file(&self, address: &str) -> StorageResult<RandomAccessFile> {
        let path = self.object_path(address)?;
        debug!("Opening input file: {address}");
        let meta = self
            .store
            .head(&path)
            .await
            .map_err(|e| StorageError::from_object_store(address, e))?;
        Ok(RandomAccessFile::new(
            address,
            Arc::clone(&self.store),
            path,
            meta.size,
        ))
    }

    /// Open an object for writing.
    ///
    /// Nothing is visible at `address` until the returned stream is closed.
    pub fn open_output_stream(
        &self,
        address: &str,
        content_type: &'static str,
    ) -> StorageResult<OutputStream> {
        let path = self.object_path(address)?;
        debug!("Opening output stream: {address}");
        let mut attributes = Attributes::new();
        if self.backend.keeps_attributes() {
            attributes.insert(Attribute::ContentType, content_type.into());
        }
        Ok(OutputStream::new(
            address,
            Arc::clone(&self.store),
            path,
            attributes,
        ))
    }

    /// Look up the content type recorded on an object.
    ///
    /// Returns `None` when the object carries no content type, which is always
    /// the case on backends that do not keep attributes.
    pub async fn content_type(&self, address: &str) -> StorageResult<Option<String>> {
        let path = self.object_path(address)?;
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self
            .store
            .get_opts(&path, options)
            .await
            .map_err(|e| StorageError::from_object_store(address, e))?;
        Ok(result.attributes.get(&Attribute::ContentType).map(|value| {
            let value: &str = value.as_ref();
            value.to_string()
        }))
    }
}
