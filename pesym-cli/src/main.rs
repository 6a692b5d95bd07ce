mod app;
mod commands;
mod output;

use anyhow::Context;
use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .context("failed to set Ctrl+C handler")?;

    let cli = Cli::parse();

    // pesym info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("pesym", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Info { path } => commands::info::run(path, &cli.global),
        Command::Dos { path } => commands::dos::run(path, &cli.global),
        Command::Sections { path } => commands::sections::run(path, &cli.global),
        Command::Exports { path, full } => commands::exports::run(path, *full, &cli.global),
        Command::Imports { path, full } => commands::imports::run(path, *full, &cli.global),
        Command::All { path, full } => commands::all::run(path, *full, &cli.global),
        Command::Demangle { symbols, full } => {
            commands::demangle::run(symbols, *full, &cli.global)
        }
    }
}
