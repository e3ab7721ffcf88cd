//! cfgtree CLI Binary
//!
//! Command-line interface for browsing and editing a cluster's configuration files.

use anyhow::Context;
use cfgtree::logging::init_logging;
use cfgtree::tooling::cli::{describe_error, Cli, CliContext};
use clap::Parser;
use std::process;

fn run(cli: &Cli) -> anyhow::Result<String> {
    let context = CliContext::new(cli).context("Error initializing session")?;
    if let Err(e) = init_logging(Some(context.logging_config())) {
        eprintln!("Warning: logging disabled: {}", e);
    }
    context
        .execute(&cli.command)
        .map_err(|e| anyhow::anyhow!(describe_error(&e)))
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
