// src/bin/envmod.rs

use clap::Parser;
use colored::*;
use envmod::cli::{self, Cli};
use std::io;

/// Entry point of the `envmod` binary.
/// Sets up logging, runs the request and performs centralized error handling.
fn main() {
    env_logger::init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli::run(&Cli::parse(), &mut out) {
        Ok(status) => std::process::exit(status),
        Err(e) => {
            // `{:#}` keeps the whole context chain on one line.
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}
