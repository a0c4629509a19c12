//! CLI argument definitions for bugsplit.

use std::path::PathBuf;

use bugsplit_core::config::{diagnostics, polling, target};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bugsplit")]
#[command(about = "Bug Fables memory introspector", version)]
pub struct Args {
    /// Process name to attach to
    #[arg(long, env = "BUGSPLIT_PROCESS", default_value = target::PROCESS_NAME)]
    pub process: String,

    /// Diagnostic log file for version detection outcomes
    #[arg(
        long,
        value_name = "FILE",
        env = "BUGSPLIT_LOG_FILE",
        default_value = diagnostics::DEFAULT_LOG_FILE
    )]
    pub log_file: PathBuf,

    /// Do not write the diagnostic log
    #[arg(long)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    pub fn diagnostic_log(&self) -> Option<&PathBuf> {
        (!self.no_log_file).then_some(&self.log_file)
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Poll the game and report changes (default)
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = polling::POLL_INTERVAL_MS)]
        interval_ms: u64,
        /// Emit one JSON snapshot per change instead of text
        #[arg(long)]
        json: bool,
    },
    /// Attach once and print the detected layout and a snapshot
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the known layout profiles
    Profiles {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Watch {
            interval_ms: polling::POLL_INTERVAL_MS,
            json: false,
        }
    }
}
