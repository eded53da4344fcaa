//! Trigger plumbing: turning an object-created notification into the
//! `(bucket, key)` pair the handler consumes, deciding which keys to skip,
//! and the result reported back to the caller.

use std::fmt;

use aws_lambda_events::event::s3::S3Event;
use log::debug;
use serde::Serialize;
use snafu::prelude::*;

/// Errors raised while reading a trigger event.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TriggerError {
    /// The payload is not a valid S3 notification.
    #[snafu(display("Invalid S3 event payload: {source}"))]
    InvalidEventJson {
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The notification carries no records.
    #[snafu(display("S3 event has no records"))]
    NoRecords,

    /// The first record has no bucket name.
    #[snafu(display("S3 event record has no bucket name"))]
    MissingBucket,

    /// The first record has no object key.
    #[snafu(display("S3 event record has no object key"))]
    MissingKey,

    /// The object key is not valid percent-encoded UTF-8.
    #[snafu(display("Failed to decode object key {key}: {source}"))]
    KeyDecode {
        /// The raw key as found in the event.
        key: String,
        /// Underlying decode error.
        source: std::string::FromUtf8Error,
    },
}

/// Result alias for trigger operations.
pub type TriggerResult<T> = Result<T, TriggerError>;

/// An object that was created and should be considered for transformation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectCreated {
    /// Bucket holding the object.
    pub bucket: String,
    /// Decoded object key.
    pub key: String,
}

impl ObjectCreated {
    /// Take the first record of an S3 notification.
    pub fn from_event(event: &S3Event) -> TriggerResult<Self> {
        let record = event.records.first().context(NoRecordsSnafu)?;
        let bucket = record.s3.bucket.name.clone().context(MissingBucketSnafu)?;
        let raw_key = record.s3.object.key.as_deref().context(MissingKeySnafu)?;
        let key = decode_key(raw_key)?;
        debug!("Event object: bucket={bucket} key={key}");
        Ok(Self { bucket, key })
    }

    /// Parse a JSON S3 notification and take its first record.
    pub fn from_json(payload: &str) -> TriggerResult<Self> {
        let event: S3Event = serde_json::from_str(payload).context(InvalidEventJsonSnafu)?;
        Self::from_event(&event)
    }
}

/// Decode a key as S3 notifications encode it: `+` for spaces, then
/// percent-escapes.
pub fn decode_key(raw: &str) -> TriggerResult<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .context(KeyDecodeSnafu { key: raw })
}

/// Why a key was not handed to the transform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The key contains a configured marker (for example a metadata sidecar).
    Marker(String),
    /// The key's extension is not allowed (`None` when it has none).
    Extension(Option<String>),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Marker(marker) => write!(f, "key contains {marker:?}"),
            SkipReason::Extension(Some(ext)) => write!(f, "extension {ext:?} is not allowed"),
            SkipReason::Extension(None) => write!(f, "key has no extension"),
        }
    }
}

/// Pre-filter over incoming keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkipFilter {
    markers: Vec<String>,
    allowed_extensions: Vec<String>,
}

impl Default for SkipFilter {
    fn default() -> Self {
        Self::new(["metadata"], ["csv", "parquet"])
    }
}

impl SkipFilter {
    /// Skip keys containing any of `markers`, or whose extension (without the
    /// dot) is not in `allowed_extensions`. An empty allow-list admits every
    /// extension.
    pub fn new<M, E>(
        markers: impl IntoIterator<Item = M>,
        allowed_extensions: impl IntoIterator<Item = E>,
    ) -> Self
    where
        M: Into<String>,
        E: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
            allowed_extensions: allowed_extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Return why `key` should be skipped, or `None` to process it.
    pub fn skip_reason(&self, key: &str) -> Option<SkipReason> {
        if let Some(marker) = self.markers.iter().find(|m| key.contains(m.as_str())) {
            return Some(SkipReason::Marker(marker.clone()));
        }

        if self.allowed_extensions.is_empty() {
            return None;
        }

        let name = key.rsplit('/').next().unwrap_or(key);
        let extension = name
            .rfind('.')
            .filter(|i| *i > 0)
            .map(|i| &name[i + 1..]);
        match extension {
            Some(ext) if self.allowed_extensions.iter().any(|a| a == ext) => None,
            other => Some(SkipReason::Extension(other.map(str::to_string))),
        }
    }

    /// Whether `key` should be skipped.
    pub fn should_skip(&self, key: &str) -> bool {
        self.skip_reason(key).is_some()
    }
}

/// What a successful invocation reports back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransformedFile {
    /// Key of the written object.
    pub key: String,
    /// Content type recorded on the written object, as reported by the store.
    pub content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn event_json(bucket: &str, key: &str) -> String {
        serde_json::json!({
            "Records": [{
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "us-east-1",
                "eventTime": "2024-01-01T00:00:00.000Z",
                "eventName": "ObjectCreated:Put",
                "userIdentity": { "principalId": "EXAMPLE" },
                "requestParameters": { "sourceIPAddress": "127.0.0.1" },
                "responseElements": {
                    "x-amz-request-id": "EXAMPLE123456789",
                    "x-amz-id-2": "EXAMPLE123/5678abcdefghijklambdaisawesome/mnopqrstuvwxyzABCDEFGH"
                },
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "configurationId": "testConfigRule",
                    "bucket": {
                        "name": bucket,
                        "ownerIdentity": { "principalId": "EXAMPLE" },
                        "arn": format!("arn:aws:s3:::{bucket}")
                    },
                    "object": {
                        "key": key,
                        "size": 1024,
                        "eTag": "0123456789abcdef0123456789abcdef",
                        "sequencer": "0A1B2C3D4E5F678901"
                    }
                }
            }]
        })
        .to_string()
    }

    #[test]
    fn decodes_plus_and_percent_escapes() -> TestResult {
        assert_eq!(decode_key("raw/my+file%2Bv2.csv")?, "raw/my file+v2.csv");
        assert_eq!(decode_key("raw/caf%C3%A9.csv")?, "raw/café.csv");
        Ok(())
    }

    #[test]
    fn rejects_invalid_utf8_escape() {
        let err = decode_key("raw/%FF.csv").expect_err("invalid utf-8");
        assert!(matches!(err, TriggerError::KeyDecode { .. }));
    }

    #[test]
    fn extracts_first_record() -> TestResult {
        let json = event_json(
            "hub-bucket",
            "raw/model-output/team1-model1/2420-01-01-team1-model1.csv",
        );
        let object = ObjectCreated::from_json(&json)?;
        assert_eq!(object.bucket, "hub-bucket");
        assert_eq!(
            object.key,
            "raw/model-output/team1-model1/2420-01-01-team1-model1.csv"
        );
        Ok(())
    }

    #[test]
    fn extracted_key_is_decoded() -> TestResult {
        let json = event_json("b", "raw/a+b/2420-01-01-t-m.csv");
        assert_eq!(ObjectCreated::from_json(&json)?.key, "raw/a b/2420-01-01-t-m.csv");
        Ok(())
    }

    #[test]
    fn empty_event_has_no_records() {
        let err = ObjectCreated::from_json(r#"{"Records": []}"#).expect_err("no records");
        assert!(matches!(err, TriggerError::NoRecords));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = ObjectCreated::from_json("not json").expect_err("bad json");
        assert!(matches!(err, TriggerError::InvalidEventJson { .. }));
    }

    #[test]
    fn default_filter_skips_metadata_and_unknown_types() {
        let filter = SkipFilter::default();

        assert_eq!(
            filter.skip_reason("raw/model-metadata/team1-model1.yml"),
            Some(SkipReason::Marker("metadata".to_string()))
        );
        assert_eq!(
            filter.skip_reason("raw/model-output/team1-model1/notes.txt"),
            Some(SkipReason::Extension(Some("txt".to_string())))
        );
        assert_eq!(
            filter.skip_reason("raw/model-output/team1-model1/README"),
            Some(SkipReason::Extension(None))
        );
        assert!(!filter.should_skip("raw/model-output/t-m/2420-01-01-t-m.csv"));
        assert!(!filter.should_skip("raw/model-output/t-m/2420-01-01-t-m.parquet"));
    }

    #[test]
    fn custom_filter_uses_configured_lists() {
        let filter = SkipFilter::new(["sidecar"], Vec::<String>::new());
        assert!(filter.should_skip("raw/sidecar/x.csv"));
        assert!(!filter.should_skip("raw/model-metadata/anything.bin"));
    }

    #[test]
    fn transformed_file_serializes_to_json() -> TestResult {
        let info = TransformedFile {
            key: "p/2420-01-01-t-m.parquet".to_string(),
            content_type: Some("application/vnd.apache.parquet".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&info)?,
            serde_json::json!({
                "key": "p/2420-01-01-t-m.parquet",
                "content_type": "application/vnd.apache.parquet"
            })
        );
        Ok(())
    }
}
