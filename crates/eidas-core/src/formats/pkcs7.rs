//! CMS/PKCS#7 signature parser (`.sig`, `.p7s`).

use std::fs;
use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use super::common;
use super::traits::ContainerFormat;
use crate::signature::Payload;
use crate::signature::SignatureEngine;
use crate::types::SignedItem;

/// Parser for CMS signatures.
///
/// An enveloping signature carries the signed document; with an engine
/// available, the document is recovered and written next to the signature
/// under the signature's name minus its extension. A detached signature
/// names its document in a `filename="..."` header or by naming convention.
#[derive(Clone)]
pub struct DetachedSignatureParser {
    file: SignedItem,
    engine: Option<Arc<dyn SignatureEngine>>,
}

impl std::fmt::Debug for DetachedSignatureParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetachedSignatureParser")
            .field("file", &self.file)
            .field("engine", &self.engine.is_some())
            .finish()
    }
}

impl DetachedSignatureParser {
    /// Creates a parser bound to `file`.
    ///
    /// Without an engine, enveloped content is not recovered.
    #[must_use]
    pub fn new(file: SignedItem, engine: Option<Arc<dyn SignatureEngine>>) -> Self {
        Self { file, engine }
    }

    /// Returns the file this parser is bound to.
    #[must_use]
    pub fn file(&self) -> &SignedItem {
        &self.file
    }

    fn detached_by_contents(&self) -> Vec<SignedItem> {
        let bytes = match fs::read(self.file.path()) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %self.file.path().display(), error = %err, "cannot read signature");
                return Vec::new();
            }
        };
        let text = String::from_utf8_lossy(&bytes);

        text.lines()
            .find(|line| line.contains("filename="))
            .and_then(common::filename_marker)
            .and_then(|name| common::existing_sibling(&self.file, name))
            .into_iter()
            .collect()
    }
}

impl ContainerFormat for DetachedSignatureParser {
    fn validation_payload(&self) -> Option<Payload> {
        Some(Payload::new(self.file.path()))
    }

    fn attached_files(&self) -> Vec<SignedItem> {
        let Some(engine) = &self.engine else {
            debug!(path = %self.file.path().display(), "no signature engine, skipping content recovery");
            return Vec::new();
        };
        let Some(stem) = self.file.path().file_stem() else {
            return Vec::new();
        };
        let target = self.file.parent_dir().join(stem);
        if target == self.file.path() || target.exists() {
            debug!(target = %target.display(), "recovery target already present");
            return Vec::new();
        }

        let payload = Payload::new(self.file.path());
        let documents = match engine.extract_original_documents(&payload, 0) {
            Ok(documents) => documents,
            Err(err) => {
                warn!(path = %self.file.path().display(), error = %err, "cannot recover signed content");
                return Vec::new();
            }
        };
        let Some(original) = documents.into_iter().next() else {
            debug!(path = %self.file.path().display(), "signature carries no original document");
            return Vec::new();
        };

        if let Err(err) = common::write_attachment(&target, &original) {
            warn!(target = %target.display(), error = %err, "cannot write recovered content");
            return Vec::new();
        }

        if target.is_file() {
            vec![SignedItem::extracted_from(target, &self.file)]
        } else {
            Vec::new()
        }
    }

    fn detached_files(&self, candidates: &[SignedItem]) -> Vec<SignedItem> {
        common::merge_without_duplicates(
            self.detached_by_contents(),
            common::detached_by_filename(&self.file, candidates),
        )
    }

    fn format_name(&self) -> &str {
        "pkcs7-signature"
    }
}
