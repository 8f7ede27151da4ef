//! PDF parser.

use super::traits::ContainerFormat;
use crate::signature::Payload;
use crate::types::SignedItem;

/// Parser for PDF documents.
///
/// PAdES signatures are embedded in the document itself, so the document is
/// its own payload and never has detached content.
#[derive(Debug, Clone)]
pub struct PdfParser {
    file: SignedItem,
}

impl PdfParser {
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
}

impl ContainerFormat for PdfParser {
    fn validation_payload(&self) -> Option<Payload> {
        Some(Payload::new(self.file.path()))
    }

    fn attached_files(&self) -> Vec<SignedItem> {
        Vec::new()
    }

    fn detached_files(&self, _candidates: &[SignedItem]) -> Vec<SignedItem> {
        Vec::new()
    }

    fn format_name(&self) -> &str {
        "pdf"
    }
}
