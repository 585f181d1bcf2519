//! CLI command definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// rampart - rate-based rule reconciler
#[derive(Parser, Debug)]
#[command(name = "rampart")]
#[command(version)]
#[command(
    about = "Reconciles declarative rate-based firewall rules against an eventually consistent rule store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile one resource request to a terminal response
    Reconcile {
        /// Request JSON file (reads stdin when omitted)
        #[arg(short, long)]
        request: Option<PathBuf>,

        /// Seconds to wait between settlement polls
        #[arg(long, default_value_t = 30)]
        poll_interval: u64,

        /// Ceiling in seconds for the poll backoff
        #[arg(long, default_value_t = 30)]
        poll_ceiling: u64,

        /// Give up after this many settlement retries
        #[arg(long, default_value_t = 15)]
        max_retries: u32,

        /// PENDING polls the in-memory store reports before settling
        #[arg(long, default_value_t = 0)]
        pending_polls: u32,
    },
}
