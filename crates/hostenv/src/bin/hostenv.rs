//! Hosting environment inspection CLI.
//!
//! This binary delegates to `hostenv::cli` for command logic, keeping the
//! reports testable without spawning a process.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use hostenv::SystemProcess;
use hostenv::cli::{Cli, run};
use mockable::DefaultEnv;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let env = DefaultEnv::new();
    let probe = cli.probe(SystemProcess);
    match run(&cli.command, &env, &probe, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_internal() => {
            if let Err(write_err) = writeln!(io::stderr().lock(), "fatal: {err}") {
                drop(write_err);
            }
            std::process::abort();
        }
        Err(err) => {
            if let Err(write_err) = writeln!(io::stderr().lock(), "{err}") {
                drop(write_err);
            }
            ExitCode::FAILURE
        }
    }
}
