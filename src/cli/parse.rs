//! CLI parse: clap types for ddlgen. No behavior; definitions only.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ddlgen - generate create and drop DDL scripts for a persistence unit
#[derive(Debug, Parser)]
#[command(name = "ddlgen", version)]
#[command(about = "Generate schema DDL scripts from persistence unit metadata, offline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory; relative paths resolve against it
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (replaces global and workspace config files)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the create and drop scripts
    Generate {
        #[command(flatten)]
        args: GenerateArgs,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show the merged generation configuration without generating
    Config {
        #[command(flatten)]
        args: GenerateArgs,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List the persistence units visible from the input directory
    Units {
        /// Search root holding META-INF/persistence.xml
        #[arg(long)]
        input_dir: Option<PathBuf>,
        /// Compiled-output location searched after the input dir
        #[arg(long)]
        fallback_dir: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Generation flags; each one overrides the loaded configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct GenerateArgs {
    /// Persistence unit name
    #[arg(long, short = 'u')]
    pub unit: Option<String>,

    /// Search root holding META-INF/persistence.xml
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Compiled-output location searched after the input dir
    #[arg(long)]
    pub fallback_dir: Option<PathBuf>,

    /// Driver name (selects the SQL dialect when no URL scheme matches)
    #[arg(long)]
    pub driver: Option<String>,

    /// Connection URL (its scheme selects the SQL dialect)
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Directory the scripts are written to (created if absent)
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Create-script filename
    #[arg(long)]
    pub create_file: Option<String>,

    /// Drop-script filename
    #[arg(long)]
    pub drop_file: Option<String>,

    /// Override property, applied last (repeatable)
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,

    /// Fail on entity types that exist only in mapping metadata
    #[arg(long)]
    pub no_virtual: bool,

    /// Stop waiting for the generation worker after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Parse `key=value`; the value may be empty and may contain `=`.
pub fn parse_property(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty property key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}
