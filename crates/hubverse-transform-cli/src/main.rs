//! Event-driven entry point for model-output transforms.
//!
//! `hubverse-transform handle-event` reads an S3 object-created notification
//! (from a file or stdin), `hubverse-transform transform` takes the bucket and
//! key directly. Either way the object is filtered, transformed to Parquet and
//! the written key is printed as JSON on stdout.

mod error;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use hubverse_transform_core::{
    BackendKind, ModelOutputHandler, ObjectCreated, SkipFilter, TransformConfig, TransformResult,
    TransformedFile,
    config::{DEFAULT_ORIGIN_PREFIX, DEFAULT_REGION},
};
use log::{error, info};
use snafu::{OptionExt, ResultExt};
use tokio::io::AsyncReadExt;

use crate::error::{
    CliResult, MissingLocalRootSnafu, ReadEventSnafu, ReadEventStdinSnafu, SerializeResultSnafu,
    TransformSnafu, TriggerSnafu,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    S3,
    Local,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Transform the object named by an S3 notification event
    HandleEvent {
        /// Path to the event JSON, or `-` for stdin
        #[arg(long, default_value = "-")]
        event: PathBuf,
    },

    /// Transform one object given its bucket and (decoded) key
    Transform {
        #[arg(long)]
        bucket: String,

        #[arg(long)]
        key: String,
    },
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Leading key segment that marks raw model-output uploads
    #[arg(long, global = true, env = "HUBVERSE_ORIGIN_PREFIX", default_value = DEFAULT_ORIGIN_PREFIX)]
    origin_prefix: String,

    /// Storage backend
    #[arg(long, global = true, value_enum, default_value_t = BackendArg::S3)]
    backend: BackendArg,

    /// Directory holding one sub-directory per bucket (local backend)
    #[arg(long, global = true, env = "HUBVERSE_LOCAL_ROOT")]
    local_root: Option<PathBuf>,

    /// Fixed S3 region; skips the bucket region lookup
    #[arg(long, global = true, env = "HUBVERSE_REGION")]
    region: Option<String>,

    /// Region used when the bucket region lookup fails
    #[arg(long, global = true, env = "HUBVERSE_DEFAULT_REGION", default_value = DEFAULT_REGION)]
    default_region: String,

    /// Endpoint override for S3-compatible stores
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    endpoint: Option<String>,

    /// S3 request timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    request_timeout: u64,

    /// S3 connect timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    connect_timeout: u64,

    /// Skip keys containing this marker (repeatable)
    #[arg(long = "skip-marker", global = true, default_values_t = [String::from("metadata")])]
    skip_markers: Vec<String>,

    /// Only transform keys with this extension (repeatable)
    #[arg(
        long = "allowed-extension",
        global = true,
        default_values_t = [String::from("csv"), String::from("parquet")]
    )]
    allowed_extensions: Vec<String>,
}

impl ConfigArgs {
    fn transform_config(&self) -> CliResult<TransformConfig> {
        let backend = match self.backend {
            BackendArg::S3 => BackendKind::S3,
            BackendArg::Local => {
                let root = self.local_root.clone().context(MissingLocalRootSnafu)?;
                BackendKind::Local(root)
            }
        };

        Ok(TransformConfig {
            origin_prefix: self.origin_prefix.clone(),
            backend,
            region: self.region.clone(),
            default_region: self.default_region.clone(),
            endpoint: self.endpoint.clone(),
            request_timeout: Duration::from_secs(self.request_timeout),
            connect_timeout: Duration::from_secs(self.connect_timeout),
        })
    }

    fn skip_filter(&self) -> SkipFilter {
        SkipFilter::new(
            self.skip_markers.iter().cloned(),
            self.allowed_extensions.iter().cloned(),
        )
    }
}

#[derive(Debug, Parser)]
#[command(version, about = "Transform hub model-output files to Parquet")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    #[command(flatten)]
    config: ConfigArgs,
}

async fn read_event(path: &Path) -> CliResult<String> {
    if path.as_os_str() == "-" {
        let mut payload = String::new();
        tokio::io::stdin()
            .read_to_string(&mut payload)
            .await
            .context(ReadEventStdinSnafu)?;
        Ok(payload)
    } else {
        tokio::fs::read_to_string(path)
            .await
            .context(ReadEventSnafu { path })
    }
}

async fn transform(
    bucket: &str,
    key: &str,
    config: &TransformConfig,
) -> TransformResult<TransformedFile> {
    let handler = ModelOutputHandler::from_config(bucket, key, config).await?;
    info!("{handler}");
    let (_, written) = handler.transform().await?;
    handler.describe_output(&written).await
}

async fn transform_object(
    object: &ObjectCreated,
    config: &TransformConfig,
) -> CliResult<TransformedFile> {
    let ObjectCreated { bucket, key } = object;
    info!("Transforming object {key} from bucket {bucket}");

    transform(bucket, key, config)
        .await
        .inspect_err(|e| error!("{e}"))
        .context(TransformSnafu {
            bucket: bucket.as_str(),
            key: key.as_str(),
        })
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let object = match cli.cmd {
        Command::HandleEvent { event } => {
            let payload = read_event(&event).await?;
            ObjectCreated::from_json(&payload).context(TriggerSnafu)?
        }
        Command::Transform { bucket, key } => ObjectCreated { bucket, key },
    };

    if let Some(reason) = cli.config.skip_filter().skip_reason(&object.key) {
        info!("Skipping {}: {reason}", object.key);
        return Ok(());
    }

    let config = cli.config.transform_config()?;
    let transformed = transform_object(&object, &config).await?;

    let json = serde_json::to_string(&transformed).context(SerializeResultSnafu)?;
    println!("{json}");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
