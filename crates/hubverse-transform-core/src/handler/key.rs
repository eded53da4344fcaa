//! Object key decomposition.

use std::fmt;

use snafu::ensure;

use crate::error::{KeyFormatSnafu, PathPrefixSnafu, TransformResult, UnsupportedFileTypeSnafu};

/// Encoding of a model-output file, derived from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    /// Delimited text (`.csv`), read sequentially.
    Csv,
    /// Columnar binary (`.parquet`), read with random access.
    Parquet,
}

impl FileType {
    /// Map a key suffix (including the leading dot) to a file type.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            ".csv" => Some(FileType::Csv),
            ".parquet" => Some(FileType::Parquet),
            _ => None,
        }
    }

    /// Extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Parquet => "parquet",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// The parts of an object key that the transform depends on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectKeyParts {
    /// Parent directory of the object, origin segment included.
    pub prefix: String,
    /// Base name of the object without its extension.
    pub file_name: String,
    /// Encoding derived from the extension.
    pub file_type: FileType,
    /// Parent directory with the origin segment stripped (`.` at the root).
    pub destination_path: String,
}

impl ObjectKeyParts {
    /// Split `key` into its parts, requiring it to live under `origin_prefix`.
    ///
    /// An absolute key never matches an origin segment. Keys with empty, `.`
    /// or `..` segments (`raw//a/b.csv`, `raw/./b.csv`) are rejected: the
    /// object they name cannot be read back through an object path.
    pub fn parse(key: &str, origin_prefix: &str) -> TransformResult<Self> {
        let segments: Vec<&str> = if key.starts_with('/') {
            Vec::new()
        } else {
            key.split('/').collect()
        };

        ensure!(
            segments.first() == Some(&origin_prefix),
            PathPrefixSnafu {
                key,
                origin_prefix,
            }
        );

        if let Some(segment) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return KeyFormatSnafu {
                key,
                reason: format!("invalid path segment {segment:?}"),
            }
            .fail();
        }

        let name = segments[segments.len() - 1];
        let (stem, suffix) = split_suffix(name);
        let file_type = FileType::from_suffix(suffix).ok_or_else(|| {
            UnsupportedFileTypeSnafu {
                key,
                extension: suffix,
            }
            .build()
        })?;

        // The object itself cannot be the origin segment.
        ensure!(
            segments.len() >= 2,
            PathPrefixSnafu {
                key,
                origin_prefix,
            }
        );

        let parents = &segments[..segments.len() - 1];
        let destination_path = if parents.len() == 1 {
            ".".to_string()
        } else {
            parents[1..].join("/")
        };

        Ok(Self {
            prefix: parents.join("/"),
            file_name: stem.to_string(),
            file_type,
            destination_path,
        })
    }
}

/// Split a file name into stem and suffix. A leading dot does not start a
/// suffix, and a trailing dot yields an empty one.
fn split_suffix(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 && i < name.len() - 1 => (&name[..i], &name[i..]),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;

    #[test]
    fn parses_nested_key() {
        let parts = ObjectKeyParts::parse(
            "raw/prefix1/prefix2/2420-01-01-janeways_addiction-voyager1.csv",
            "raw",
        )
        .expect("valid key");

        assert_eq!(parts.prefix, "raw/prefix1/prefix2");
        assert_eq!(parts.file_name, "2420-01-01-janeways_addiction-voyager1");
        assert_eq!(parts.file_type, FileType::Csv);
        assert_eq!(parts.destination_path, "prefix1/prefix2");
    }

    #[test]
    fn destination_path_strips_origin() {
        let cases = [
            ("raw", "raw/prefix1/prefix2/2420-01-01-team-model.csv", "prefix1/prefix2"),
            (
                "raw",
                "raw/model-output/prefix1/prefix2/2420-01-01-team-model.csv",
                "model-output/prefix1/prefix2",
            ),
            (
                "raw",
                "raw/prefix1/prefix2/prefix3/prefix4/2420-01-01-team-model.csv",
                "prefix1/prefix2/prefix3/prefix4",
            ),
            ("raw", "raw/2420-01-01-team-model.csv", "."),
            (
                "different-origin",
                "different-origin/prefix1/2420-01-01-team-model.parquet",
                "prefix1",
            ),
        ];

        for (origin, key, expected) in cases {
            let parts = ObjectKeyParts::parse(key, origin).expect("valid key");
            assert_eq!(parts.destination_path, expected, "key {key}");
        }
    }

    #[test]
    fn rejects_unaddressable_segments() {
        for key in [
            "raw//a/2420-01-01-t-m.csv",
            "raw/./b/2420-01-01-t-m.parquet",
            "raw/a/../2420-01-01-t-m.csv",
            "raw/a/",
        ] {
            let err = ObjectKeyParts::parse(key, "raw").expect_err(key);
            assert!(matches!(err, TransformError::KeyFormat { .. }), "key {key}: {err}");
        }
    }

    #[test]
    fn rejects_wrong_origin() {
        let err = ObjectKeyParts::parse(
            "raw/prefix1/prefix2/2000-01-01-team1-model1.csv",
            "custom-raw-prefix",
        )
        .expect_err("wrong origin");
        assert!(matches!(err, TransformError::PathPrefix { .. }));
    }

    #[test]
    fn origin_must_be_a_whole_segment() {
        let err = ObjectKeyParts::parse("rawdata/2000-01-01-team1-model1.csv", "raw")
            .expect_err("partial segment");
        assert!(matches!(err, TransformError::PathPrefix { .. }));

        let err = ObjectKeyParts::parse("/raw/2000-01-01-team1-model1.csv", "raw")
            .expect_err("absolute key");
        assert!(matches!(err, TransformError::PathPrefix { .. }));
    }

    #[test]
    fn rejects_unsupported_extensions() {
        for key in [
            "raw/prefix1/prefix2/2000-01-01-team1-model1.jpg",
            "raw/prefix1/2000-01-01-team1-model1.CSV",
            "raw/prefix1/2000-01-01-team1-model1",
            "raw/prefix1/2000-01-01-team1-model1.csv.",
            "raw/prefix1/.csv",
            "raw",
        ] {
            let err = ObjectKeyParts::parse(key, "raw").expect_err("unsupported type");
            assert!(
                matches!(err, TransformError::UnsupportedFileType { .. }),
                "key {key}: {err}"
            );
        }
    }

    #[test]
    fn file_type_display_includes_dot() {
        assert_eq!(FileType::Csv.to_string(), ".csv");
        assert_eq!(FileType::Parquet.extension(), "parquet");
    }
}
