use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelshelf")]
#[command(author, version, about = "Local media library indexer")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog database to use instead of the configured one
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan media folders into the catalog
    Scan {
        /// Folders to scan (defaults to the configured library folders)
        folders: Vec<PathBuf>,

        /// Print scan events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// List catalog items
    List {
        /// Media type: movie, tvshow, other or all
        #[arg(long = "type")]
        media_type: Option<String>,

        /// Only items with this genre
        #[arg(long)]
        genre: Option<String>,

        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,

        /// Sort key: title, year, rating, last played, play count, date added
        #[arg(long)]
        sort: Option<String>,

        /// Maximum number of items
        #[arg(long, default_value = "50")]
        limit: usize,

        /// Items to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a file name without touching the catalog
    Parse {
        /// File name to parse
        #[arg(required = true)]
        filename: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show item counts by type
    Stats,

    /// List the genres present in the catalog
    Genres {
        /// Restrict to one media type
        #[arg(long = "type")]
        media_type: Option<String>,
    },

    /// Show recent scans
    History {
        /// Number of scans to show
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Remove one item from the catalog
    Remove {
        /// Item ID
        id: String,
    },

    /// Remove every item from the catalog
    Clear {
        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },

    /// Re-resolve one item's metadata
    Refresh {
        /// Item ID
        id: String,
    },

    /// Correct one item's metadata by hand
    Edit {
        /// Item ID
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        year: Option<u16>,

        /// Replaces all genres; repeat for several
        #[arg(long = "genre")]
        genres: Vec<String>,

        #[arg(long)]
        rating: Option<f64>,

        #[arg(long)]
        synopsis: Option<String>,

        #[arg(long)]
        external_id: Option<String>,

        #[arg(long)]
        poster_url: Option<String>,

        #[arg(long)]
        backdrop_url: Option<String>,
    },

    /// Record that an item was played
    Play {
        /// Item ID
        id: String,
    },

    /// Validate configuration file
    CheckConfig,

    /// Display version information
    Version,
}
