use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::types::BoundingBox;

/// Where the database lives.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Data directory holding feedvault.db (overrides database.path from --config)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and apply the schema
    Init {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Import a GTFS zip archive unless it is unchanged since the last import
    Import {
        /// Path to the feed archive
        file: PathBuf,

        /// Source label recorded with the import (defaults to the file path)
        #[arg(long)]
        source: Option<String>,

        /// Abort the import after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Delete all feed rows, keeping the last import record
    Clear {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Show the last import and row counts
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// List stops inside a bounding box
    Stops {
        /// min_lat,min_lon,max_lat,max_lon
        #[arg(long, allow_hyphen_values = true)]
        bbox: BoundingBox,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        store: StoreArgs,
    },
}
