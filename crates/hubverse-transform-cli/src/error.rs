use std::path::PathBuf;

use hubverse_transform_core::{TransformError, TriggerError};
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Failed to read S3 event from {}: {source}", path.display()))]
    ReadEvent {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to read S3 event from stdin: {source}"))]
    ReadEventStdin { source: std::io::Error },

    #[snafu(display("Could not extract an object from the S3 event: {source}"))]
    Trigger { source: TriggerError },

    #[snafu(display("--backend local requires --local-root"))]
    MissingLocalRoot,

    #[snafu(display("Error transforming object {key} from bucket {bucket}"))]
    Transform {
        bucket: String,
        key: String,
        #[snafu(source(from(TransformError, Box::new)))]
        source: Box<TransformError>,
    },

    #[snafu(display("Failed to serialize transform result"))]
    SerializeResult { source: serde_json::Error },
}
