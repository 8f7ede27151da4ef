//! Per-request scratch directories.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;
use tracing::info;
use tracing::warn;

use crate::Result;
use crate::VerifyError;
use crate::types::SignedItem;

const FILES_DIR: &str = "files";
const POLICY_DIR: &str = "policy";
const POLICY_FILE: &str = "policy.xml";
const FALLBACK_UPLOAD_NAME: &str = "upload";

/// A unique directory owned by a single request.
///
/// Layout:
/// - `files/`: root of every [`SignedItem`] discovered for the request
/// - `policy/`: uploaded validation policy, if any
///
/// The directory and everything under it is removed when the workspace is
/// dropped, on success, on error, and on unwinding. Workspaces created with
/// `keep = true` stay on disk and their location is logged.
///
/// # Examples
///
/// ```no_run
/// use eidas_core::Workspace;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let workspace = Workspace::create(&std::env::temp_dir(), false)?;
/// let top = workspace.write_upload("contract.pdf", b"%PDF-1.7")?;
/// assert!(top.path().starts_with(workspace.files_dir()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
    keep: bool,
}

impl Workspace {
    /// Creates a new workspace under `temp_root`.
    ///
    /// If the directory cannot be created under `temp_root`, the system
    /// temporary directory is tried instead.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::Workspace` if neither location is usable.
    pub fn create(temp_root: &Path, keep: bool) -> Result<Self> {
        let dir = match Self::create_in(temp_root) {
            Ok(dir) => dir,
            Err(err) => {
                let fallback = std::env::temp_dir();
                warn!(
                    root = %temp_root.display(),
                    fallback = %fallback.display(),
                    error = %err,
                    "cannot create workspace under configured root, using system temp dir"
                );
                Self::create_in(&fallback).map_err(|source| VerifyError::Workspace {
                    path: fallback,
                    source,
                })?
            }
        };

        let root = dir.path().canonicalize()?;
        fs::create_dir(root.join(FILES_DIR))?;
        fs::create_dir(root.join(POLICY_DIR))?;

        Ok(Self {
            dir: Some(dir),
            root,
            keep,
        })
    }

    fn create_in(temp_root: &Path) -> std::io::Result<TempDir> {
        fs::create_dir_all(temp_root)?;
        tempfile::Builder::new().prefix("req-").tempdir_in(temp_root)
    }

    /// Returns the workspace directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Returns the root directory of all discovered files.
    #[must_use]
    pub fn files_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR)
    }

    /// Returns the directory holding the uploaded policy.
    #[must_use]
    pub fn policy_dir(&self) -> PathBuf {
        self.root.join(POLICY_DIR)
    }

    /// Writes the uploaded document and returns it as the top-level item.
    ///
    /// Only the last component of `name` is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_upload(&self, name: &str, bytes: &[u8]) -> Result<SignedItem> {
        let files = self.files_dir();
        let path = files.join(sanitize_upload_name(name));
        fs::write(&path, bytes)?;
        Ok(SignedItem::new(path, files))
    }

    /// Writes an uploaded validation policy and returns its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_policy(&self, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.policy_dir().join(POLICY_FILE);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        if self.keep {
            let kept = dir.keep();
            info!(path = %kept.display(), "keeping request workspace");
        } else if let Err(err) = dir.close() {
            warn!(path = %self.root.display(), error = %err, "failed to remove request workspace");
        }
    }
}

/// Reduces a client-supplied upload name to a bare file name.
///
/// Both `/` and `\` count as separators; names that reduce to nothing,
/// `.` or `..` become `upload`.
#[must_use]
pub fn sanitize_upload_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match last {
        "" | "." | ".." => FALLBACK_UPLOAD_NAME.to_string(),
        other => other.replace('\0', ""),
    }
}
