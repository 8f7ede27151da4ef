//! Parser selection by content classification.

use std::path::Path;
use std::sync::Arc;

use tracing::trace;

use super::ContainerParser;
use super::detect;
use super::detect::FormatClassifier;
use super::detect::FormatKind;
use super::passthrough::PassthroughParser;
use super::pdf::PdfParser;
use super::pkcs7::DetachedSignatureParser;
use super::xml::XmlSignatureParser;
use super::zip::ZipArchiveParser;
use crate::signature::SignatureEngine;
use crate::types::SignedItem;

/// Maps a file to the parser for its content type.
///
/// The decision uses the file's bytes only; names and extensions are ignored.
#[derive(Clone)]
pub struct ParserSelector {
    classifier: Arc<dyn FormatClassifier>,
    engine: Option<Arc<dyn SignatureEngine>>,
}

impl std::fmt::Debug for ParserSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserSelector")
            .field("engine", &self.engine.is_some())
            .finish_non_exhaustive()
    }
}

impl ParserSelector {
    /// Creates a selector.
    ///
    /// The engine, if any, is handed to CMS parsers for content recovery.
    #[must_use]
    pub fn new(
        classifier: Arc<dyn FormatClassifier>,
        engine: Option<Arc<dyn SignatureEngine>>,
    ) -> Self {
        Self { classifier, engine }
    }

    /// Classifies the file at `path`.
    #[must_use]
    pub fn classify_file(&self, path: &Path) -> FormatKind {
        detect::classify_file(self.classifier.as_ref(), path)
    }

    /// Returns the parser bound to `file`.
    #[must_use]
    pub fn select(&self, file: &SignedItem) -> ContainerParser {
        let kind = self.classify_file(file.path());
        trace!(path = %file.path().display(), %kind, "file classified");

        let file = file.clone();
        match kind {
            FormatKind::Pkcs7Signature => ContainerParser::DetachedSignature(
                DetachedSignatureParser::new(file, self.engine.clone()),
            ),
            FormatKind::Pdf => ContainerParser::Pdf(PdfParser::new(file)),
            FormatKind::Xml => ContainerParser::XmlSignature(XmlSignatureParser::new(file)),
            FormatKind::Zip => ContainerParser::ZipArchive(ZipArchiveParser::new(file)),
            FormatKind::Other(_) => ContainerParser::Passthrough(PassthroughParser::new(file)),
        }
    }
}
