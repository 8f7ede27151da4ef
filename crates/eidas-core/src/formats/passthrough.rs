//! Parser for content that is neither a container nor a signature.

use super::traits::ContainerFormat;
use crate::signature::Payload;
use crate::types::SignedItem;

/// Parser for unrecognized files: no payload, no attachments, no detached
/// files.
#[derive(Debug, Clone)]
pub struct PassthroughParser {
    file: SignedItem,
}

impl PassthroughParser {
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

impl ContainerFormat for PassthroughParser {
    fn validation_payload(&self) -> Option<Payload> {
        None
    }

    fn attached_files(&self) -> Vec<SignedItem> {
        Vec::new()
    }

    fn detached_files(&self, _candidates: &[SignedItem]) -> Vec<SignedItem> {
        Vec::new()
    }

    fn format_name(&self) -> &str {
        "passthrough"
    }
}
