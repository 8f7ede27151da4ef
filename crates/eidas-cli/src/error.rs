//! Error conversion utilities for CLI.
//!
//! Converts eidas-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::Result;
use anyhow::anyhow;
use eidas_core::VerifyError;
use std::path::Path;

/// Converts `VerifyError` to user-friendly anyhow error with context
pub fn convert_verify_error(err: VerifyError, file: &Path) -> anyhow::Error {
    match err {
        VerifyError::EmptyUpload => {
            anyhow!(
                "Document '{}' is empty\n\
                 HINT: Upload the signed document itself, not a placeholder.",
                file.display()
            )
        }
        VerifyError::Workspace { path, source } => {
            anyhow!(
                "Cannot prepare a workspace for '{}' under '{}': {}\n\
                 HINT: Set temp_dir in the configuration file to a writable directory.",
                file.display(),
                path.display(),
                source
            )
        }
        VerifyError::InvalidArchive(reason) => {
            anyhow!(
                "Invalid archive '{}': {}\n\
                 HINT: The container may be corrupted or truncated.",
                file.display(),
                reason
            )
        }
        VerifyError::Config(reason) => {
            anyhow!(
                "Invalid configuration: {}\n\
                 HINT: Check the file passed with --config.",
                reason
            )
        }
        VerifyError::Io(io_err) => {
            anyhow!(
                "I/O error while processing '{}': {}",
                file.display(),
                io_err
            )
        }
        _ => anyhow::Error::from(err)
            .context(format!("Error processing '{}'", file.display())),
    }
}

/// Adds file context to a core result
pub fn add_file_context<T>(result: Result<T, VerifyError>, file: &Path) -> anyhow::Result<T> {
    result.map_err(|e| convert_verify_error(e, file))
}
