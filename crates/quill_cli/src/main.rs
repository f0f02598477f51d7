//! Main entry point for the Quill CLI.

use clap::Parser;
use quill_cli::{verbosity, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!("quill={}", verbosity(&cli)))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match quill_cli::run(cli) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
