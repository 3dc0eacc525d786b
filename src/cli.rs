use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Check and evaluate media download filter expressions
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Download config file (TOML) with per-chat filters
    #[arg(long, global = true, env = "MEDIA_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase verbosity (-v info, -vv debug with filter tracing)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a filter expression without evaluating it
    Check {
        /// Filter expression, e.g. "file_size >= 10MB"
        expr: String,
    },
    /// Evaluate a filter expression against every message in a file
    Eval {
        /// Filter expression
        expr: String,

        /// JSON or JSON5 array of messages
        #[arg(short, long)]
        messages: PathBuf,
    },
    /// Apply a chat's configured filter and list the messages to download
    Select {
        /// Chat id as configured in the config file
        #[arg(short, long, allow_negative_numbers = true)]
        chat: i64,

        /// JSON or JSON5 array of messages
        #[arg(short, long)]
        messages: PathBuf,
    },
    /// Check every filter in the config file
    ValidateConfig,
    /// List the fields a filter expression can reference
    Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
