use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seek-page")]
#[command(about = "Searches a site's paginated listing for a word and reports where and when it was published")]
#[command(version)]
pub struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Per-page request timeout in seconds (overrides the configuration)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum number of pages to visit per search (overrides the configuration)
    #[arg(long, global = true)]
    pub max_pages: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one search and print the outcome
    Search {
        /// First page of the listing
        url: String,

        /// Word to look for (case-insensitive)
        word: String,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve searches through a Telegram bot
    Telegram,
}
