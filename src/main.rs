use std::process::ExitCode;

use crate::cli::run;

pub mod cli;
mod config;
pub mod discovery;
pub mod export;
pub mod extract;
pub mod metadata;
pub mod tags;

fn main() -> ExitCode {
    run()
}
