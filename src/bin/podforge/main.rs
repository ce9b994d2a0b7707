//! Podforge CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use podforge::builder::BuildError;
use podforge::core::ConfigError;
use podforge::util::diagnostic::emit;

mod cli;
mod commands;

use cli::{Cli, Commands, GlobalOpts};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        if let Some(err) = e.downcast_ref::<BuildError>() {
            emit(&err.to_diagnostic(), color);
        } else if let Some(err) = e.downcast_ref::<ConfigError>() {
            emit(&err.to_diagnostic(), color);
        } else {
            eprintln!("error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // RUST_LOG wins over the verbosity flags
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("podforge=debug")
        } else if cli.quiet {
            EnvFilter::new("podforge=warn")
        } else {
            EnvFilter::new("podforge=info,podforge::xcodebuild=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let opts = GlobalOpts {
        verbose: cli.verbose,
        quiet: cli.quiet,
        color: !cli.no_color,
        message_format: cli.message_format,
        xcodebuild: cli.xcodebuild,
    };

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &opts),
        Commands::Sync(args) => commands::sync::execute(args, &opts),
        Commands::Targets(args) => commands::targets::execute(args, &opts),
        Commands::Def(args) => commands::def::execute(args, &opts),
        Commands::Doctor(args) => commands::doctor::execute(args, &opts),
        Commands::Clean(args) => commands::clean::execute(args, &opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
