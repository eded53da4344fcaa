use std::{fmt, sync::Arc};

use object_store::{Attributes, ObjectStore, buffered::BufWriter, path::Path as ObjectPath};
use snafu::ResultExt;
use tokio::io::AsyncWriteExt;

use crate::storage::{BackendError, OtherIoSnafu, StorageResult};

/// A buffered writer for one object.
///
/// Bytes are buffered and uploaded (as a multipart upload once the buffer
/// outgrows a single request). The object only appears at its address once
/// [`OutputStream::close`] succeeds; dropping the stream abandons the write.
pub struct OutputStream {
    address: String,
    writer: BufWriter,
}

impl fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputStream")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl OutputStream {
    pub(crate) fn new(
        address: &str,
        store: Arc<dyn ObjectStore>,
        path: ObjectPath,
        attributes: Attributes,
    ) -> Self {
        Self {
            address: address.to_string(),
            writer: BufWriter::new(store, path).with_attributes(attributes),
        }
    }

    /// Address the stream writes to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Mutable handle for streaming bytes.
    pub fn writer(&mut self) -> &mut BufWriter {
        &mut self.writer
    }

    /// Flush buffered bytes and complete the upload.
    pub async fn close(mut self) -> StorageResult<()> {
        self.writer
            .shutdown()
            .await
            .map_err(BackendError::Io)
            .context(OtherIoSnafu {
                address: self.address.clone(),
            })
    }

    /// Hand the underlying writer to an encoder that completes it itself.
    pub(crate) fn into_inner(self) -> BufWriter {
        self.writer
    }
}
