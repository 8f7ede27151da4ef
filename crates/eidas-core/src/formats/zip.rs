//! ZIP container parser (plain ZIP and ASiC packages).

use std::collections::HashSet;
use std::fs;
use std::fs::File;
use std::io;
use std::path::Path;

use tracing::debug;
use tracing::warn;

use super::traits::ContainerFormat;
use crate::Result;
use crate::signature::Payload;
use crate::types::SignedItem;

/// Parser for ZIP containers.
///
/// The archive itself is not validated; every regular entry is inflated
/// into the archive's directory and validated on its own.
#[derive(Debug, Clone)]
pub struct ZipArchiveParser {
    file: SignedItem,
}

impl ZipArchiveParser {
    /// Creates a parser bound to `file`.
    #[must_use]
    pub fn new(file: SignedItem) -> Self {
        Self { file }
    }

    /// Returns the file this parser is bound to.
    #[must_use]
    pub fn file(&self) -> &SignedItem {
        &self.file
    }

    fn extract_all(&self) -> Result<Vec<SignedItem>> {
        let mut archive = zip::ZipArchive::new(File::open(self.file.path())?)?;
        let dest = self.file.parent_dir().to_path_buf();

        let mut seen = HashSet::new();
        let mut extracted = Vec::new();

        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(archive = %self.file.path().display(), index, error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            let Some(relative) = entry.enclosed_name() else {
                warn!(entry = entry.name(), "skipping entry with unsafe path");
                continue;
            };
            let target = dest.join(relative);

            if entry.is_dir() {
                if let Err(err) = fs::create_dir_all(&target) {
                    warn!(target = %target.display(), error = %err, "cannot create directory entry");
                }
                continue;
            }
            if entry.is_symlink() {
                warn!(entry = entry.name(), "skipping symlink entry");
                continue;
            }
            if target == self.file.path() {
                warn!(entry = entry.name(), "skipping entry that would overwrite its archive");
                continue;
            }

            if let Err(err) = write_entry(&mut entry, &target) {
                warn!(target = %target.display(), error = %err, "cannot extract entry");
                continue;
            }
            if target.is_file() && seen.insert(target.clone()) {
                extracted.push(SignedItem::extracted_from(target, &self.file));
            }
        }

        debug!(archive = %self.file.path().display(), files = extracted.len(), "archive extracted");
        Ok(extracted)
    }
}

fn write_entry(entry: &mut impl io::Read, target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(target)?;
    io::copy(entry, &mut out)?;
    Ok(())
}

impl ContainerFormat for ZipArchiveParser {
    fn validation_payload(&self) -> Option<Payload> {
        None
    }

    fn attached_files(&self) -> Vec<SignedItem> {
        self.extract_all().unwrap_or_else(|err| {
            warn!(archive = %self.file.path().display(), error = %err, "cannot read archive");
            Vec::new()
        })
    }

    fn detached_files(&self, _candidates: &[SignedItem]) -> Vec<SignedItem> {
        Vec::new()
    }

    fn format_name(&self) -> &str {
        "zip"
    }
}
