use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bdstream")]
#[command(author, version, about = "Blu-ray navigation and streaming tool")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show disc identity and title list
    Info {
        /// Disc description to open
        #[arg(required = true)]
        disc: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stream a title to a file
    Dump {
        /// Disc description to open
        #[arg(required = true)]
        disc: PathBuf,

        /// Title to play (defaults to the main title)
        #[arg(short, long)]
        title: Option<u32>,

        /// Output file
        #[arg(short, long, required = true)]
        output: PathBuf,

        /// Skip still frames instead of waiting them out
        #[arg(long)]
        skip_stills: bool,
    },

    /// Print a resume token for a position on the disc
    Snapshot {
        /// Disc description to open
        #[arg(required = true)]
        disc: PathBuf,

        /// Title to position on (defaults to the main title)
        #[arg(short, long)]
        title: Option<u32>,

        /// Chapter to position on (1-based)
        #[arg(long)]
        chapter: Option<u32>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
