//! CLI/library version pinning.

use crate::CliError;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// The lockfile in the project root that pins the library version the
/// project was generated against.
pub const VERSION_PIN_FILE: &str = "quill.lock.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionPin {
    library_version: String,
}

/// Compares the CLI version against the project's pinned library version.
///
/// An absent lockfile is not an error; a present but unparsable one is.
/// `ignore_mismatch` suppresses the mismatch error, not parse failures.
pub fn check_version_pin(
    project_root: &Path,
    cli_version: &str,
    ignore_mismatch: bool,
) -> Result<(), CliError> {
    let path = project_root.join(VERSION_PIN_FILE);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(_) => {
            debug!("no version pin at {}", path.display());
            return Ok(());
        }
    };
    let pin: VersionPin = serde_json::from_str(&contents)?;

    if pin.library_version != cli_version {
        if ignore_mismatch {
            debug!(
                pinned = %pin.library_version,
                cli = %cli_version,
                "ignoring version mismatch"
            );
            return Ok(());
        }
        return Err(CliError::VersionMismatch {
            cli: cli_version.to_string(),
            library: pin.library_version,
        });
    }
    Ok(())
}
