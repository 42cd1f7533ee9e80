//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use clickshare::{AllocationMode, OutputFormat, PartialRoles};

/// clickshare: spread page-level analytics metrics over search queries
#[derive(Parser)]
#[command(name = "clickshare")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Allocate breakdown metrics to queries and write the processed table
    Process {
        /// Path to the joined data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        roles: RoleArgs,

        /// Breakdown metric columns to allocate
        #[arg(short, long = "breakdown", value_name = "COLUMN", num_args = 1..)]
        breakdown: Vec<String>,

        /// Leave the date column out of the grouping key
        #[arg(long)]
        no_date: bool,

        /// Collapse rows onto url, country, device and query
        #[arg(long)]
        aggregate: bool,

        /// Zero-click policy
        #[arg(short, long)]
        mode: Option<AllocationMode>,

        /// JSON config with role bindings and options
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Field delimiter (default: detected)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output path (default: <file>_processed.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (default: from output extension, else csv)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Print the run summary as JSON instead of text
        #[arg(long)]
        summary_json: bool,
    },

    /// List headers and the roles guessed for them
    Columns {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a config file pre-filled with guessed roles
    Init {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output path for the config (default: <file>.clickshare.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Explicit column bindings; unset roles are guessed from the headers.
#[derive(Args, Debug, Default)]
pub struct RoleArgs {
    /// Landing page column
    #[arg(long, value_name = "COLUMN")]
    pub url: Option<String>,

    /// Device category column
    #[arg(long, value_name = "COLUMN")]
    pub device: Option<String>,

    /// Country column
    #[arg(long, value_name = "COLUMN")]
    pub country: Option<String>,

    /// Date column
    #[arg(long, value_name = "COLUMN")]
    pub date: Option<String>,

    /// Search query column
    #[arg(long, value_name = "COLUMN")]
    pub query: Option<String>,

    /// Clicks column
    #[arg(long, value_name = "COLUMN")]
    pub clicks: Option<String>,

    /// Impressions column
    #[arg(long, value_name = "COLUMN")]
    pub impressions: Option<String>,
}

impl RoleArgs {
    /// Convert into a partial binding carrying the given breakdown columns.
    pub fn into_partial(self, breakdown: Vec<String>) -> PartialRoles {
        PartialRoles {
            url: self.url,
            device: self.device,
            country: self.country,
            date: self.date,
            query: self.query,
            clicks: self.clicks,
            impressions: self.impressions,
            breakdown,
        }
    }
}
