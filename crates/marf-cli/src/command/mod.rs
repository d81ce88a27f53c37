use clap::{Parser, Subcommand};

use self::{classify::ClassifyArg, inspect::InspectArg, train::TrainArg};

mod classify;
mod inspect;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "warn", value_parser = parse_log_level)]
    log_level: log::LevelFilter,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train a subject on one or more sample files
    Train(#[clap(flatten)] TrainArg),
    /// Classify a sample file against the trained subjects
    Classify(#[clap(flatten)] ClassifyArg),
    /// Show what is stored for a configuration
    Inspect(#[clap(flatten)] InspectArg),
}

fn parse_log_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("expected off, error, warn, info, debug or trace, got `{s}`"))
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .init();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Classify(arg) => classify::run(&arg)?,
        Mode::Inspect(arg) => inspect::run(&arg)?,
    }
    Ok(())
}
