//! # chaussee CLI
//!
//! Command-line front end of `chaussee_core`: creates projects, checks
//! them against NF P98-086 and exposes the GNT and traffic tables.
//!
//! Exit code 0 on success, 1 on error, 2 when `check` finds out-of-norm
//! values or composition errors.

mod cli;
mod commands;
mod logging;

use clap::Parser;

use crate::cli::{Cli, Command};
use crate::logging::{init_logging, LogConfig};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(&LogConfig::from_verbosity(cli.verbose)) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let result = match &cli.command {
        Command::New(args) => commands::run_new(args).map(|_| 0),
        Command::Check(args) => commands::run_check(args).and_then(|report| {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                commands::print_check(&report);
            }
            Ok(if report.has_errors() { 2 } else { 0 })
        }),
        Command::Gnt(args) => commands::run_gnt(args).map(|_| 0),
        Command::Traffic(args) => commands::run_traffic(args).map(|_| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            tracing::error!(code = error.error_code(), "{}", error);
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}
