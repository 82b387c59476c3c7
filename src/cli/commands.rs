//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// LODES employment statistics loader
#[derive(Parser, Debug)]
#[command(name = "lodes-loader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Loader configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// DuckDB database file, or `:memory:`
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Base URL of the LODES file server
    #[arg(short, long, global = true)]
    pub endpoint: Option<String>,

    /// File of valid state codes; the first two characters of each line are used
    #[arg(long, global = true)]
    pub states_file: Option<PathBuf>,

    /// Report format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load crosswalk and dataset files
    Load {
        /// Comma separated two-letter state codes, or `all`
        #[arg(long)]
        states: String,

        /// Comma separated dataset groups (od, rac, wac), or `all`
        #[arg(long, alias = "files", default_value = "all")]
        groups: String,

        /// Comma separated segments (S000, SA01.. for rac/wac; main, aux for od), or `all`
        #[arg(long, default_value = "all")]
        segments: String,

        /// Comma separated job types (JT00..JT05), or `all`
        #[arg(long, alias = "job_types", default_value = "all")]
        job_types: String,

        /// Comma separated years, or `all` for 2002-2011
        #[arg(long, default_value = "all")]
        years: String,

        /// Do not load the geographic crosswalk tables
        #[arg(long, alias = "skip_geo")]
        skip_geo: bool,

        /// Keep going when a file cannot be reached
        #[arg(long)]
        continue_on_connection_error: bool,

        /// Build geography indexes on the dataset collections
        #[arg(long)]
        index_datasets: bool,

        /// Rows per dataset bulk write
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Load only the geographic crosswalk tables
    Xwalk {
        /// Comma separated two-letter state codes, or `all`
        #[arg(long)]
        states: String,
    },
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON object on one line
    Json,
    /// Human-readable summary
    Pretty,
}
