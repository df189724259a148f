//! Command-line interface definition for Backchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for serving the chat-history API and inspecting
//! the local chat store.

use clap::{Parser, Subcommand};

/// Backchat - chat-history pagination and visibility core
///
/// Serves the internal portal's chat-history API and offers local
/// inspection of the chat store.
#[derive(Parser, Debug, Clone)]
#[command(name = "backchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the chat database path
    #[arg(long, env = "BACKCHAT_HISTORY_DB")]
    pub storage_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Backchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the chat-history API
    Serve {
        /// Override the bind address from config (e.g. 0.0.0.0:9000)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Inspect the local chat store
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// History inspection subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List an owner's chats, most recent first
    List {
        /// Owner whose history to list
        #[arg(short, long)]
        owner: String,

        /// Maximum number of chats to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Delete a chat
    Delete {
        /// Owner the chat belongs to
        #[arg(short, long)]
        owner: String,

        /// Chat id to delete
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
