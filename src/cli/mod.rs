pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "satchel")]
#[command(about = "A terminal client for a personal bookmark server", long_about = None)]
pub struct Cli {
    /// Bookmark server base URL (overrides the config file)
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List favorite bookmarks, most visited first
    Favorites {
        /// Number of bookmarks to show
        #[arg(short, long)]
        count: Option<u32>,
    },
    /// List recently visited bookmarks
    Recents {
        /// Number of bookmarks to show
        #[arg(short, long)]
        count: Option<u32>,
    },
    /// Search bookmarks by title or URL
    Search {
        /// Search phrase
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Add a bookmark
    Add {
        /// URL to bookmark
        url: String,
    },
    /// Mark a bookmark as favorite
    Star {
        url: String,
    },
    /// Remove a bookmark from favorites
    Unstar {
        url: String,
    },
    /// Record a visit and open the bookmark in the browser
    Open {
        url: String,
    },
    /// Interactive prompt: type a URL to add it, anything else to search
    Shell,
}
