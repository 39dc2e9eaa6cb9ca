#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::struct_excessive_bools)]

mod commands;
mod logging;

use clap::Parser;
use commands::scan::ScanOptions;
use depscan_core::Config;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "depscan")]
#[command(author, version, about = "Dependency trees for Composer and Maven projects", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Print the dependency trees of the project in the working directory
    Scan {
        /// Never run `composer install` to create a missing lockfile
        #[arg(long)]
        no_install: bool,

        /// Remote Maven repository URL (repeatable, replaces the configured list)
        #[arg(long = "repo", value_name = "URL")]
        repos: Vec<String>,

        /// Give up after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Use only local data: lockfiles, installed packages, the local Maven repository
        #[arg(long)]
        offline: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        None | Some(Commands::Version) => commands::version::run(),
        Some(Commands::Scan {
            no_install,
            repos,
            timeout,
            offline,
        }) => {
            let config = Config::for_project(cwd)
                .into_diagnostic()?
                .with_verbosity(cli.verbose)
                .with_json_logs(cli.json);
            logging::init(config.verbosity, config.json_logs);

            let options = ScanOptions {
                no_install,
                repos,
                timeout_secs: timeout,
                offline,
            };
            commands::scan::run(config, &options, cli.json)
        }
    }
}
