//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Classify Dispatch - send one stored image to several inference models
#[derive(Parser, Debug)]
#[command(
    name = "classify-dispatch",
    author,
    version,
    about = "Multi-model image classification dispatcher",
    long_about = "Handles a storage event naming one image: fetches it, submits it to every\n\
                  registered inference model, and writes one JSON result per model back\n\
                  to the image's bucket."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CLASSIFY_DISPATCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CLASSIFY_DISPATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one storage event
    Handle(HandleArgs),

    /// List the compiled-in inference targets
    Targets(TargetsArgs),

    /// Validate settings and credentials without processing anything
    Validate(ValidateArgs),
}

/// Source of the trigger event
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = true)]
pub struct EventSource {
    /// Event JSON file in storage-notification layout ("-" reads stdin)
    #[arg(short, long, conflicts_with_all = ["bucket", "key"])]
    pub event: Option<PathBuf>,

    /// Bucket of the image (instead of --event)
    #[arg(long, requires = "key")]
    pub bucket: Option<String>,

    /// Key of the image (instead of --event)
    #[arg(long, requires = "bucket")]
    pub key: Option<String>,
}

/// Arguments for the `handle` command
#[derive(Parser, Debug, Clone)]
pub struct HandleArgs {
    #[command(flatten)]
    pub source: EventSource,

    /// Settings file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "CLASSIFY_DISPATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the object store root directory
    #[arg(long, env = "CLASSIFY_DISPATCH_STORE_ROOT")]
    pub store_root: Option<PathBuf>,

    /// Override the inference API base URL
    #[arg(long, env = "CLASSIFY_DISPATCH_BASE_URL")]
    pub base_url: Option<String>,

    /// Invoke all targets at once instead of one after another
    #[arg(long)]
    pub concurrent: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CLASSIFY_DISPATCH_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `targets` command
#[derive(Parser, Debug)]
pub struct TargetsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Settings file to validate; defaults are validated when omitted
    #[arg(short, long, env = "CLASSIFY_DISPATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
