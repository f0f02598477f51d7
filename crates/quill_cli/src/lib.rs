//! Command-line interface for Quill.
//!
//! # Usage
//!
//! ```bash
//! # Generate code from the default config
//! quill generate
//!
//! # Generate from an explicit config file
//! quill generate --path ./quill-codegen-config.json
//!
//! # Generate from inline JSON (takes precedence over --path)
//! quill generate --string '{"schemaNamespace": ...}'
//!
//! # Download the schema first
//! quill generate --fetch-schema
//! ```

mod generate;
mod version;

pub use generate::GenerateArgs;
pub use version::{check_version_pin, VERSION_PIN_FILE};

use clap::{Parser, Subcommand};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate Swift sources from a schema and operation documents
    Generate(GenerateArgs),
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Missing schema download configuration.")]
    MissingSchemaDownloadConfig,

    #[error("Quill CLI version {cli} does not match the library version {library} pinned by this project. Pass --ignore-version-mismatch to continue anyway.")]
    VersionMismatch { cli: String, library: String },

    #[error("could not read {path}: {message}")]
    UnreadableFile { path: String, message: String },

    #[error("invalid codegen configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("schema file not found at {0}")]
    MissingSchema(String),
}

/// The log level the subscriber should be initialized with.
pub fn verbosity(cli: &Cli) -> &'static str {
    match &cli.command {
        Commands::Generate(args) if args.verbose => "debug",
        Commands::Generate(_) => "warn",
    }
}

/// Runs a parsed invocation. Any error maps to a non-zero exit code in main.
pub fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Generate(args) => generate::run(&args),
    }
}
