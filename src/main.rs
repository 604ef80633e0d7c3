use anyhow::{Context, Result};
use clap::Parser;

mod cli;
mod commands;

use cli::{Args, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    commands::init_logging(args.verbose);

    let config_path = commands::utils::resolve_config_path(args.config)?;
    let data_dir = args.data_dir;

    match args.command.unwrap_or(Commands::Status) {
        Commands::Check => commands::usage::check(config_path, data_dir),
        Commands::Track => commands::usage::track(config_path, data_dir),
        Commands::Status => commands::usage::status(config_path, data_dir),
        Commands::Report => commands::report::report(config_path, data_dir),
        Commands::Trends => commands::report::trends(config_path, data_dir),
        Commands::Export { path } => commands::report::export(config_path, data_dir, &path),
        Commands::Clear { yes } => commands::report::clear(config_path, data_dir, yes),
        Commands::Challenge { difficulty } => commands::usage::practice(config_path, difficulty),
        Commands::Init { output, force } => {
            commands::config::init(output.unwrap_or(config_path), force)
        }
        Commands::Settings => commands::config::settings(config_path),
        Commands::Watch { interval } => {
            let engine = commands::utils::open_engine(&config_path, data_dir)?;
            let runtime = tokio::runtime::Runtime::new()
                .context("Failed to start async runtime")?;
            runtime.block_on(commands::usage::watch(engine, interval))
        }
    }
}
