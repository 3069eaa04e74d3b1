mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{analyze, geocode, join, normalize};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    match &cli.command {
        Commands::Geocode(args) => geocode::run(&cli, args),
        Commands::Join(args) => join::run(&cli, args),
        Commands::Analyze(args) => analyze::run(&cli, args),
        Commands::Normalize(args) => normalize::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
