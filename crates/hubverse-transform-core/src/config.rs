//! Transform configuration.

use std::{path::PathBuf, time::Duration};

/// Origin segment under which raw model-output files are uploaded.
pub const DEFAULT_ORIGIN_PREFIX: &str = "raw";

/// Region used when a bucket's region cannot be resolved.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default S3 request and connect timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the transform reads and writes objects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Amazon S3, region resolved per bucket.
    #[default]
    S3,
    /// A local directory standing in for object storage; each bucket is a
    /// sub-directory of the root.
    Local(PathBuf),
}

/// Settings for one transform invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformConfig {
    /// Leading key segment that marks raw uploads.
    pub origin_prefix: String,
    /// Backend to build the accessor on.
    pub backend: BackendKind,
    /// Fixed region; skips region resolution when set.
    pub region: Option<String>,
    /// Fallback region when resolution fails.
    pub default_region: String,
    /// Endpoint override for S3-compatible stores.
    pub endpoint: Option<String>,
    /// S3 per-request timeout.
    pub request_timeout: Duration,
    /// S3 connect timeout.
    pub connect_timeout: Duration,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            origin_prefix: DEFAULT_ORIGIN_PREFIX.to_string(),
            backend: BackendKind::default(),
            region: None,
            default_region: DEFAULT_REGION.to_string(),
            endpoint: None,
            request_timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_TIMEOUT,
        }
    }
}
