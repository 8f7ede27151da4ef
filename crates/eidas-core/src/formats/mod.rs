//! Container format implementations.
//!
//! Every file discovered in a request is bound to exactly one parser,
//! chosen from its content by [`ParserSelector`]. The set of formats is
//! closed: adding one means a new [`ContainerParser`] variant and a new arm
//! in the selector.

pub mod common;
pub mod detect;
pub mod passthrough;
pub mod pdf;
pub mod pkcs7;
pub mod select;
pub mod traits;
pub mod xml;
pub mod xml_attachments;
pub mod zip;

pub use detect::FormatClassifier;
pub use detect::FormatKind;
pub use detect::MagicClassifier;
pub use select::ParserSelector;
pub use traits::ContainerFormat;

use crate::signature::Payload;
use crate::types::SignedItem;

/// Parser bound to one file, by format.
#[derive(Debug, Clone)]
pub enum ContainerParser {
    /// Content without signature semantics.
    Passthrough(passthrough::PassthroughParser),
    /// PDF document.
    Pdf(pdf::PdfParser),
    /// XML document.
    XmlSignature(xml::XmlSignatureParser),
    /// ZIP container.
    ZipArchive(zip::ZipArchiveParser),
    /// CMS/PKCS#7 signature.
    DetachedSignature(pkcs7::DetachedSignatureParser),
}

impl ContainerParser {
    fn format(&self) -> &dyn ContainerFormat {
        match self {
            Self::Passthrough(parser) => parser,
            Self::Pdf(parser) => parser,
            Self::XmlSignature(parser) => parser,
            Self::ZipArchive(parser) => parser,
            Self::DetachedSignature(parser) => parser,
        }
    }

    /// Returns the file this parser is bound to.
    #[must_use]
    pub fn file(&self) -> &SignedItem {
        match self {
            Self::Passthrough(parser) => parser.file(),
            Self::Pdf(parser) => parser.file(),
            Self::XmlSignature(parser) => parser.file(),
            Self::ZipArchive(parser) => parser.file(),
            Self::DetachedSignature(parser) => parser.file(),
        }
    }

    /// Returns `true` for XML documents.
    #[must_use]
    pub const fn is_xml(&self) -> bool {
        matches!(self, Self::XmlSignature(_))
    }
}

impl ContainerFormat for ContainerParser {
    fn validation_payload(&self) -> Option<Payload> {
        self.format().validation_payload()
    }

    fn attached_files(&self) -> Vec<SignedItem> {
        self.format().attached_files()
    }

    /// Detached matches never include the file itself or files extracted
    /// from it: those are attachments.
    fn detached_files(&self, candidates: &[SignedItem]) -> Vec<SignedItem> {
        let own = self.file().path();
        self.format()
            .detached_files(candidates)
            .into_iter()
            .filter(|item| item.path() != own && item.container() != Some(own))
            .collect()
    }

    fn format_name(&self) -> &str {
        self.format().format_name()
    }
}
