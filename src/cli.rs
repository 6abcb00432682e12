use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::DEFAULT_LOG_LEVEL;

#[derive(Parser, Debug)]
#[command(name = "arkdata-sqlite")]
#[command(version, about = "Create and inspect the Arknights operator SQLite schema")]
pub struct Cli {
    /// Log level written to stderr (trace|debug|info|warn|error|off)
    #[arg(long, global = true, env = "ARKDATA_LOG", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new database file with the full schema
    Init {
        /// Output SQLite database path (defaults to the user data directory)
        #[arg(env = "ARKDATA_DB")]
        output_db: Option<PathBuf>,

        /// Replace the file if it already exists
        #[arg(short, long)]
        force: bool,

        /// Leave tag_dict empty
        #[arg(long)]
        no_seed: bool,
    },

    /// Print the schema DDL to stdout
    Ddl {
        /// Only include these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Exclude these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Omit the DROP TABLE prelude
        #[arg(long)]
        no_drop: bool,

        /// Omit the tag_dict seed insert
        #[arg(long)]
        no_seed: bool,
    },

    /// List all table names in dependency order
    ListTables {
        /// Print full table descriptors as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
