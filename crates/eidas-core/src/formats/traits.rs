//! Common trait for container format parsers.

use crate::signature::Payload;
use crate::types::SignedItem;

/// Capabilities every container parser provides for the file it is bound to.
///
/// None of the methods fail: a parser that cannot read its file reports no
/// payload, no attachments or no detached files, and logs why.
pub trait ContainerFormat {
    /// Returns what the signature engine should validate, if anything.
    fn validation_payload(&self) -> Option<Payload>;

    /// Materializes content embedded in the file and returns the new files.
    fn attached_files(&self) -> Vec<SignedItem>;

    /// Picks, from `candidates`, the files the signature covers but does not
    /// contain.
    fn detached_files(&self, candidates: &[SignedItem]) -> Vec<SignedItem>;

    /// Returns the parser's format name.
    fn format_name(&self) -> &str;
}
