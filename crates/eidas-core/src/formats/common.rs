//! Helpers shared by the container parsers.

use std::collections::HashSet;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;
use tracing::warn;

use crate::Result;
use crate::types::SignedItem;

/// Name fragments that mark a file as a signature rather than signed content.
pub const SIGNATURE_MARKERS: [&str; 9] = [
    "XAdES", "xades", "PAdES", "pades", "CAdES", "cades", "ASiC", "asic", "sig",
];

const FILENAME_MARKER: &str = "filename=\"";

/// Returns `true` if `name` contains a signature marker.
#[must_use]
pub fn has_signature_marker(name: &str) -> bool {
    SIGNATURE_MARKERS.iter().any(|marker| name.contains(marker))
}

/// Removes the last extension of the final path component.
///
/// # Examples
///
/// ```
/// use eidas_core::formats::common::strip_extension;
///
/// assert_eq!(strip_extension("/dir/doc.pdf.xades"), "/dir/doc.pdf");
/// assert_eq!(strip_extension("/dir.v2/doc"), "/dir.v2/doc");
/// ```
#[must_use]
pub fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind('/').map_or(0, |idx| idx + 1);
    match path[name_start..].rfind('.') {
        Some(dot) => &path[..name_start + dot],
        None => path,
    }
}

/// Concatenates two lists, dropping every path already seen.
///
/// The result keeps the order of `first`, followed by the new entries of
/// `second`.
#[must_use]
pub fn merge_without_duplicates(first: Vec<SignedItem>, second: Vec<SignedItem>) -> Vec<SignedItem> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|item| seen.insert(item.path().to_path_buf()))
        .collect()
}

/// Finds detached content by naming convention.
///
/// Only applies when `file` itself is named like a signature. A candidate
/// matches when the signature's root-relative path without its extension is
/// a substring of the candidate's root-relative path, and the candidate is
/// not itself named like a signature. `doc.pdf.xades` therefore matches
/// `doc.pdf`.
#[must_use]
pub fn detached_by_filename(file: &SignedItem, candidates: &[SignedItem]) -> Vec<SignedItem> {
    if !has_signature_marker(&file.file_name()) {
        return Vec::new();
    }

    let own = format!("/{}", file.relative_path());
    let stem = strip_extension(&own);

    candidates
        .iter()
        .filter(|candidate| !has_signature_marker(&candidate.file_name()))
        .filter(|candidate| format!("/{}", candidate.relative_path()).contains(stem))
        .cloned()
        .collect()
}

/// Extracts the value of the last `filename="..."` marker in `text`.
///
/// # Examples
///
/// ```
/// use eidas_core::formats::common::filename_marker;
///
/// let header = r#"Content-Disposition: attachment; filename="umowa.pdf""#;
/// assert_eq!(filename_marker(header), Some("umowa.pdf"));
/// assert_eq!(filename_marker("no marker"), None);
/// ```
#[must_use]
pub fn filename_marker(text: &str) -> Option<&str> {
    let start = text.rfind(FILENAME_MARKER)? + FILENAME_MARKER.len();
    let rest = &text[start..];
    let name = &rest[..rest.find('"')?];
    (!name.is_empty()).then_some(name)
}

/// Resolves `name` against `base` and keeps it only if it stays under `root`.
///
/// Resolution is lexical: `.` is dropped and `..` removes the previous
/// component. Absolute names are taken as-is and must still be under `root`.
#[must_use]
pub fn resolve_within(base: &Path, root: &Path, name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.contains('\0') {
        return None;
    }

    let mut resolved = PathBuf::new();
    for component in base.join(name).components() {
        match component {
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            Component::CurDir => {}
            other => resolved.push(other),
        }
    }

    if resolved.starts_with(root) && resolved != root {
        Some(resolved)
    } else {
        warn!(name, root = %root.display(), "reference resolves outside the workspace");
        None
    }
}

/// Resolves `name` next to `file` and returns it as an item if it exists.
#[must_use]
pub fn existing_sibling(file: &SignedItem, name: &str) -> Option<SignedItem> {
    let path = resolve_within(file.parent_dir(), file.root(), name)?;
    if path.is_file() {
        Some(SignedItem::new(path, file.root()))
    } else {
        debug!(path = %path.display(), "referenced file does not exist");
        None
    }
}

/// Decodes base64 text, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns `VerifyError::InvalidBase64` if the text is not valid base64.
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Writes attachment content, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directories or the file cannot be written.
pub fn write_attachment(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    debug!(path = %path.display(), bytes = content.len(), "attachment written");
    Ok(())
}
