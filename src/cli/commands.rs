use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedgen")]
#[command(about = "Generate RSS feeds from websites using CSS selectors")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape a website and write its RSS feed
    Generate {
        /// Path to the site configuration file (JSON)
        config_file: PathBuf,

        /// Directory to write the feed into (defaults to FEEDGEN_OUTPUT_DIR or ./feeds)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print the feed to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },

    /// Check a site configuration without fetching anything
    Validate {
        /// Path to the site configuration file (JSON)
        config_file: PathBuf,
    },
}
