mod cli;
mod commands;
mod shutdown;

use anyhow::Result;
use bugsplit_core::IntrospectorConfig;
use clap::Parser;
use cli::{Args, Command};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bugsplit=info,bugsplit_core=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut config = IntrospectorConfig::builder().process_name(&args.process);
    if let Some(path) = args.diagnostic_log() {
        config = config.diagnostic_log(path);
    }
    let config = config.build();

    match args.command.unwrap_or_default() {
        Command::Watch { interval_ms, json } => commands::watch::run(config, interval_ms, json),
        Command::Status { json } => commands::status::run(config, json),
        Command::Profiles { json } => commands::profiles::run(json),
    }
}
