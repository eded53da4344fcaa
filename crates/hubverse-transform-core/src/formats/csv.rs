//! Streaming CSV reader.
//!
//! The input is consumed as a sequential byte stream. The schema is inferred
//! from a leading block of the stream, then every chunk (including that block)
//! is pushed through an incremental Arrow CSV decoder, so the object never has
//! to be buffered whole.
//!
//! Cells matching one of [`NULL_VALUES`] are read as nulls, both during
//! inference and decoding, so a numeric column holding `NA` stays numeric.

use std::{io::Cursor, sync::Arc};

use arrow::{error::ArrowError, record_batch::RecordBatch};
use arrow_csv::{ReaderBuilder, reader::Decoder, reader::Format};
use bytes::{Buf, Bytes, BytesMut};
use futures::TryStreamExt;
use log::debug;
use regex::Regex;
use snafu::ResultExt;

use crate::{
    error::{CsvReadSnafu, StorageSnafu, TransformResult},
    storage::InputStream,
    table::ModelOutputTable,
};

/// Bytes buffered from the head of the stream for schema inference.
pub const INFER_BLOCK_BYTES: usize = 1 << 20;

/// Rows per decoded record batch.
pub const BATCH_SIZE: usize = 8192;

/// Cell spellings read as null.
pub const NULL_VALUES: [&str; 17] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "N/A", "NA", "NULL", "NaN", "n/a", "nan", "null",
];

/// Anchored pattern matching exactly the entries of [`NULL_VALUES`].
fn null_regex() -> Result<Regex, ArrowError> {
    let alternatives: Vec<String> = NULL_VALUES.iter().map(|v| regex::escape(v)).collect();
    Regex::new(&format!("^(?:{})$", alternatives.join("|")))
        .map_err(|e| ArrowError::CsvError(format!("invalid null pattern: {e}")))
}

/// Read a headered CSV object into a table.
pub async fn read_csv(input: InputStream) -> TransformResult<ModelOutputTable> {
    let address = input.address().to_string();
    let mut stream = input.into_stream();

    let mut head = BytesMut::new();
    let mut exhausted = false;
    while head.len() < INFER_BLOCK_BYTES {
        match stream.try_next().await.context(StorageSnafu)? {
            Some(chunk) => head.extend_from_slice(&chunk),
            None => {
                exhausted = true;
                break;
            }
        }
    }
    let head = head.freeze();

    let sample = if exhausted {
        &head[..]
    } else {
        complete_lines(&head)
    };
    let format = Format::default()
        .with_header(true)
        .with_null_regex(null_regex().context(CsvReadSnafu {
            address: address.as_str(),
        })?);
    let (schema, sampled) = format
        .infer_schema(Cursor::new(sample), None)
        .context(CsvReadSnafu {
            address: address.as_str(),
        })?;
    if schema.fields().is_empty() {
        return Err(ArrowError::CsvError("Empty CSV file".to_string())).context(CsvReadSnafu {
            address: address.as_str(),
        });
    }
    debug!(
        "Inferred CSV schema for {address} from {sampled} records: {:?}",
        schema.fields()
    );
    let schema = Arc::new(schema);

    let mut decoder = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(format)
        .with_batch_size(BATCH_SIZE)
        .build_decoder();
    let mut batches = Vec::new();

    decode_chunk(&mut decoder, head, &mut batches).context(CsvReadSnafu {
        address: address.as_str(),
    })?;
    while let Some(chunk) = stream.try_next().await.context(StorageSnafu)? {
        decode_chunk(&mut decoder, chunk, &mut batches).context(CsvReadSnafu {
            address: address.as_str(),
        })?;
    }
    finish(&mut decoder, &mut batches).context(CsvReadSnafu {
        address: address.as_str(),
    })?;

    Ok(ModelOutputTable::new(schema, batches))
}

/// Trim `block` to its last complete line so inference never sees a
/// truncated record.
fn complete_lines(block: &[u8]) -> &[u8] {
    match block.iter().rposition(|b| *b == b'\n') {
        Some(pos) => &block[..=pos],
        None => block,
    }
}

fn decode_chunk(
    decoder: &mut Decoder,
    mut chunk: Bytes,
    batches: &mut Vec<RecordBatch>,
) -> Result<(), ArrowError> {
    while !chunk.is_empty() {
        let read = decoder.decode(&chunk)?;
        chunk.advance(read);
        if decoder.capacity() == 0 {
            if let Some(batch) = decoder.flush()? {
                batches.push(batch);
            }
        }
    }
    Ok(())
}

/// Signal end of input and flush the trailing partial batch.
fn finish(decoder: &mut Decoder, batches: &mut Vec<RecordBatch>) -> Result<(), ArrowError> {
    decoder.decode(&[])?;
    if let Some(batch) = decoder.flush()? {
        batches.push(batch);
    }
    Ok(())
}
