//! Parquet reader and writer.
//!
//! Parquet keeps its metadata in a trailing footer, so reads go through a
//! random-access handle: the footer is fetched first, then the column chunks
//! it points at. Writes stream row groups into a buffered object writer that
//! completes the upload when the file is closed.

use futures::TryStreamExt;
use parquet::{
    arrow::{
        async_reader::{ParquetObjectReader, ParquetRecordBatchStreamBuilder},
        async_writer::{AsyncArrowWriter, ParquetObjectWriter},
    },
    basic::Compression,
    file::properties::WriterProperties,
};
use snafu::ResultExt;

use crate::{
    error::{ParquetReadSnafu, ParquetWriteSnafu, TransformResult},
    formats::csv::BATCH_SIZE,
    storage::{OutputStream, RandomAccessFile},
    table::ModelOutputTable,
};

/// Writer properties for transformed output.
pub fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// Read a Parquet object into a table.
pub async fn read_parquet(file: RandomAccessFile) -> TransformResult<ModelOutputTable> {
    let address = file.address().to_string();
    let (store, path, size) = file.into_parts();
    let reader = ParquetObjectReader::new(store, path).with_file_size(size);

    let builder = ParquetRecordBatchStreamBuilder::new(reader)
        .await
        .context(ParquetReadSnafu {
            address: address.as_str(),
        })?;
    let schema = builder.schema().clone();
    let batches = builder
        .with_batch_size(BATCH_SIZE)
        .build()
        .context(ParquetReadSnafu {
            address: address.as_str(),
        })?
        .try_collect::<Vec<_>>()
        .await
        .context(ParquetReadSnafu {
            address: address.as_str(),
        })?;

    Ok(ModelOutputTable::new(schema, batches))
}

/// Encode `table` as Parquet into `output` and complete the upload.
pub async fn write_parquet(table: &ModelOutputTable, output: OutputStream) -> TransformResult<()> {
    let address = output.address().to_string();
    let sink = ParquetObjectWriter::from_buf_writer(output.into_inner());

    let mut writer =
        AsyncArrowWriter::try_new(sink, table.schema().clone(), Some(writer_properties()))
            .context(ParquetWriteSnafu {
                address: address.as_str(),
            })?;
    for batch in table.batches() {
        writer.write(batch).await.context(ParquetWriteSnafu {
            address: address.as_str(),
        })?;
    }
    writer.close().await.context(ParquetWriteSnafu {
        address: address.as_str(),
    })?;

    Ok(())
}
