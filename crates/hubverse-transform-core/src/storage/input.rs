use std::{fmt, ops::Range, sync::Arc};

use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use object_store::{ObjectStore, path::Path as ObjectPath};

use crate::storage::{StorageError, StorageResult};

/// Sequential byte stream over one object.
pub struct InputStream {
    address: String,
    inner: BoxStream<'static, object_store::Result<Bytes>>,
}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputStream")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl InputStream {
    pub(crate) fn new(
        address: &str,
        inner: BoxStream<'static, object_store::Result<Bytes>>,
    ) -> Self {
        Self {
            address: address.to_string(),
            inner,
        }
    }

    /// Address the stream was opened at.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Consume the handle, yielding byte chunks in object order.
    pub fn into_stream(self) -> BoxStream<'static, StorageResult<Bytes>> {
        let address = self.address;
        self.inner
            .map(move |chunk| chunk.map_err(|e| StorageError::from_object_store(&address, e)))
            .boxed()
    }
}

/// Random-access handle over one object of known size.
#[derive(Clone)]
pub struct RandomAccessFile {
    address: String,
    store: Arc<dyn ObjectStore>,
    path: ObjectPath,
    size: u64,
}

impl fmt::Debug for RandomAccessFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomAccessFile")
            .field("address", &self.address)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl RandomAccessFile {
    pub(crate) fn new(
        address: &str,
        store: Arc<dyn ObjectStore>,
        path: ObjectPath,
        size: u64,
    ) -> Self {
        Self {
            address: address.to_string(),
            store,
            path,
            size,
        }
    }

    /// Address the file was opened at.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Object size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the byte range `range` of the object.
    pub async fn read_range(&self, range: Range<u64>) -> StorageResult<Bytes> {
        self.store
            .get_range(&self.path, range)
            .await
            .map_err(|e| StorageError::from_object_store(&self.address, e))
    }

    pub(crate) fn into_parts(self) -> (Arc<dyn ObjectStore>, ObjectPath, u64) {
        (self.store, self.path, self.size)
    }
}
