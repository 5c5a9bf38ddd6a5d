//! Dashgrid - inspect and edit persisted dashboard layouts.

use std::process::ExitCode;

use clap::Parser;
use dashgrid_core::logging::{init_logging, log_dir, ConsoleTarget, LogConfig};

mod cli;
mod commands;

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_config = LogConfig::new(log_dir()).with_console(ConsoleTarget::Stderr).with_filter(cli.log_level.as_str());
    let _logging_guard = init_logging(log_config);

    match commands::run(&cli) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("error: {error}");
                ExitCode::FAILURE
            }
        },
        Err(error) => {
            eprintln!("{}", commands::render_error(&error));
            ExitCode::FAILURE
        }
    }
}
