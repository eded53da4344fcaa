#![allow(dead_code)]

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::array::{Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::{ArrowWriter, arrow_reader::ParquetRecordBatchReaderBuilder};

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub const BUCKET: &str = "hub-bucket";

/// Location of `key` inside `bucket` under a local-backend root.
pub fn object_path(root: &Path, bucket: &str, key: &str) -> PathBuf {
    key.split('/')
        .fold(root.join(bucket), |path, segment| path.join(segment))
}

pub fn write_object(root: &Path, bucket: &str, key: &str, body: &[u8]) -> TestResult<PathBuf> {
    let path = object_path(root, bucket, key);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, body)?;
    Ok(path)
}

pub fn model_output_csv(rows: usize) -> String {
    let mut csv = String::from("origin_date,target,horizon,location,output_type,output_type_id,value\n");
    for i in 0..rows {
        csv.push_str(&format!(
            "2420-01-01,wk inc flu hosp,{},{:02},quantile,0.5,{}.5\n",
            i % 4,
            i % 50 + 1,
            i * 10
        ));
    }
    csv
}

/// Write a small model-output table as Parquet at `path`.
pub fn write_model_output_parquet(path: &Path, rows: usize) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut location = StringBuilder::new();
    let mut horizon = Int64Builder::with_capacity(rows);
    let mut value = Float64Builder::with_capacity(rows);
    for i in 0..rows {
        location.append_value(format!("{:02}", i % 50 + 1));
        horizon.append_value((i % 4) as i64);
        value.append_value(i as f64 * 1.5);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("location", DataType::Utf8, false),
        Field::new("horizon", DataType::Int64, false),
        Field::new("value", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(location.finish()),
            Arc::new(horizon.finish()),
            Arc::new(value.finish()),
        ],
    )?;

    let mut writer = ArrowWriter::try_new(File::create(path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Read a Parquet file back as its column names and batches.
pub fn read_parquet(path: &Path) -> TestResult<(Vec<String>, Vec<RecordBatch>)> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
    let columns = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let batches = builder.build()?.collect::<Result<Vec<_>, _>>()?;
    Ok((columns, batches))
}

/// A minimal S3 object-created notification for one object.
pub fn s3_event(bucket: &str, key: &str) -> String {
    serde_json::json!({
        "Records": [{
            "eventVersion": "2.1",
            "eventSource": "aws:s3",
            "awsRegion": "us-east-1",
            "eventTime": "2024-05-01T12:00:00.000Z",
            "eventName": "ObjectCreated:Put",
            "userIdentity": { "principalId": "AWS:AIDAEXAMPLE" },
            "requestParameters": { "sourceIPAddress": "203.0.113.10" },
            "responseElements": {
                "x-amz-request-id": "C3D13FE58DE4C810",
                "x-amz-id-2": "FMyUVURIY8/IgAtTv8xRjskZQpcIZ9KG4V5Wp6S7S/JRWeUWerMUE5JgHvANOjpD"
            },
            "s3": {
                "s3SchemaVersion": "1.0",
                "configurationId": "model-output-upload",
                "bucket": {
                    "name": bucket,
                    "ownerIdentity": { "principalId": "A3NL1KOZZKExample" },
                    "arn": format!("arn:aws:s3:::{bucket}")
                },
                "object": {
                    "key": key,
                    "size": 2048,
                    "eTag": "d41d8cd98f00b204e9800998ecf8427e",
                    "sequencer": "0055AED6DCD90281E5"
                }
            }
        }]
    })
    .to_string()
}
