//! CLI argument parsing for medex
//!
//! Global flags: --collection, --quiet, --verbose, --log-level, --log-json

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Medex - export media referenced by a note collection
#[derive(Parser, Debug)]
#[command(name = "medex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Collection root directory
    #[arg(long, global = true, default_value = ".")]
    pub collection: PathBuf,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export media referenced by a deck's notes
    Export(ExportArgs),

    /// Inspect remote folder trees
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Deck path under notes/ ("." for the whole collection)
    pub deck: String,

    /// Destination folder (must already exist)
    #[arg(long = "to", value_name = "DIR")]
    pub to: PathBuf,

    /// Skip files already present under this remote folder
    /// (Drive folder link, id, or display name)
    #[arg(long, value_name = "LOCATOR")]
    pub exclude_remote: Option<String>,

    /// Restrict export to the audio extension allow-list
    #[arg(long)]
    pub audio_only: bool,

    /// Scan only this field for media references
    #[arg(long, value_name = "NAME")]
    pub field: Option<String>,

    /// Do not descend into subdecks
    #[arg(long)]
    pub no_subdecks: bool,

    /// Notes between progress updates
    #[arg(long, value_name = "N")]
    pub batch: Option<usize>,

    /// Google Drive API key (overrides config)
    #[arg(long, env = "MEDEX_GDRIVE_API_KEY", value_name = "KEY")]
    pub api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum RemoteCommands {
    /// List files under a remote root
    Ls(RemoteLsArgs),
}

#[derive(Args, Debug)]
pub struct RemoteLsArgs {
    /// Drive folder link, id, or display name; a directory path with --local
    pub locator: String,

    /// List direct children only (containers shown with a trailing /)
    #[arg(long)]
    pub flat: bool,

    /// Treat the locator as a local directory path
    #[arg(long)]
    pub local: bool,

    /// Google Drive API key (overrides config)
    #[arg(long, env = "MEDEX_GDRIVE_API_KEY", value_name = "KEY")]
    pub api_key: Option<String>,
}
