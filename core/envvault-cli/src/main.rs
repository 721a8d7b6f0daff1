//! envvault - encrypted .env files, shared through your repository.

mod cli;
mod commands;
mod editor;
mod envfile;
mod error;
mod prompt;

use clap::Parser;
use cli::Cli;
use error::exit_code;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = commands::dispatch(&cli.command) {
        eprintln!("error: {err}");
        std::process::exit(exit_code(&cli.command, &err));
    }
}
