//! XML signature parser (XAdES and government forms).

use std::fs;

use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use percent_encoding::percent_decode_str;
use roxmltree::Document;
use roxmltree::ParsingOptions;
use tracing::warn;

use super::common;
use super::traits::ContainerFormat;
use super::xml_attachments;
use super::xml_attachments::XMLDSIG_NAMESPACE;
use crate::Result;
use crate::signature::Payload;
use crate::types::SignedItem;

const REFERENCE_ELEMENT: &str = "Reference";
const DESCRIPTION_ELEMENT: &str = "Description";
const URI_ATTRIBUTE: &str = "URI";
const DECLARATION_START: &[u8] = b"<?xml";
const ENCODING_PSEUDO_ATTRIBUTE: &[u8] = b"encoding";

/// Parser for XML documents.
///
/// The document is its own payload. Attachments are embedded base64 content
/// (see [`xml_attachments`]); detached content is found through
/// `ds:Reference/@URI`, `filename="..."` markers in `Description` elements,
/// and the naming convention shared by all signature formats.
#[derive(Debug, Clone)]
pub struct XmlSignatureParser {
    file: SignedItem,
}

impl XmlSignatureParser {
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

    fn read_source(&self) -> Result<String> {
        decode_source(&fs::read(self.file.path())?)
    }

    /// Reads and parses the document, logging why it could not be used.
    fn with_document<T>(&self, default: T, f: impl FnOnce(&Document<'_>) -> T) -> T {
        let source = match self.read_source() {
            Ok(source) => source,
            Err(err) => {
                warn!(path = %self.file.path().display(), error = %err, "cannot read XML document");
                return default;
            }
        };
        match parse(&source) {
            Ok(doc) => f(&doc),
            Err(err) => {
                warn!(path = %self.file.path().display(), error = %err, "cannot parse XML document");
                default
            }
        }
    }

    fn detached_by_reference(&self, doc: &Document<'_>) -> Vec<SignedItem> {
        doc.descendants()
            .filter(|node| node.has_tag_name((XMLDSIG_NAMESPACE, REFERENCE_ELEMENT)))
            .filter_map(|node| node.attribute(URI_ATTRIBUTE))
            .filter(|uri| !uri.is_empty() && !uri.starts_with('#'))
            .filter_map(|uri| common::existing_sibling(&self.file, &url_decode(uri)))
            .collect()
    }

    fn detached_by_description(&self, doc: &Document<'_>) -> Vec<SignedItem> {
        doc.descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == DESCRIPTION_ELEMENT)
            .filter_map(|node| {
                let text = xml_attachments::text_content(&node);
                let name = common::filename_marker(&text)?;
                common::existing_sibling(&self.file, &url_decode(name))
            })
            .collect()
    }
}

impl ContainerFormat for XmlSignatureParser {
    fn validation_payload(&self) -> Option<Payload> {
        Some(Payload::new(self.file.path()))
    }

    fn attached_files(&self) -> Vec<SignedItem> {
        self.with_document(Vec::new(), |doc| {
            xml_attachments::extract_attachments(doc, &self.file)
        })
    }

    fn detached_files(&self, candidates: &[SignedItem]) -> Vec<SignedItem> {
        let structural = self.with_document(Vec::new(), |doc| {
            common::merge_without_duplicates(
                self.detached_by_reference(doc),
                self.detached_by_description(doc),
            )
        });
        common::merge_without_duplicates(
            structural,
            common::detached_by_filename(&self.file, candidates),
        )
    }

    fn format_name(&self) -> &str {
        "xml"
    }
}

/// Parses XML with DTDs rejected.
///
/// # Errors
///
/// Returns `VerifyError::InvalidXml` if the text is not well-formed.
pub fn parse(source: &str) -> Result<Document<'_>> {
    let options = ParsingOptions {
        allow_dtd: false,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(source, options)?)
}

/// Decodes an XML document to text.
///
/// A byte-order mark wins over the `encoding` declaration; without either
/// the document is UTF-8. Declarations naming an encoding that is not
/// ASCII-compatible are ignored, since they were just read as ASCII.
///
/// # Errors
///
/// Returns `VerifyError::InvalidXml` if the bytes are not valid in the
/// chosen encoding.
///
/// # Examples
///
/// ```
/// use eidas_core::formats::xml::decode_source;
///
/// let latin2 = b"<?xml version=\"1.0\" encoding=\"ISO-8859-2\"?><a>\xB1</a>";
/// assert_eq!(
///     decode_source(latin2).unwrap(),
///     "<?xml version=\"1.0\" encoding=\"ISO-8859-2\"?><a>\u{105}</a>"
/// );
/// ```
pub fn decode_source(bytes: &[u8]) -> Result<String> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| declared_encoding(bytes))
        .unwrap_or(UTF_8);

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(crate::VerifyError::InvalidXml(format!(
            "document is not valid {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

/// Reads the `encoding` pseudo-attribute of the XML declaration.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let declaration = bytes.strip_prefix(DECLARATION_START)?;
    let declaration = &declaration[..declaration.windows(2).position(|w| w == b"?>")?];

    let at = declaration
        .windows(ENCODING_PSEUDO_ATTRIBUTE.len())
        .position(|w| w == ENCODING_PSEUDO_ATTRIBUTE)?;
    let rest = declaration[at + ENCODING_PSEUDO_ATTRIBUTE.len()..].trim_ascii_start();
    let rest = rest.strip_prefix(b"=")?.trim_ascii_start();
    let (&quote, value) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let label = &value[..value.iter().position(|&b| b == quote)?];

    Encoding::for_label(label).filter(|encoding| encoding.is_ascii_compatible())
}

/// Decodes a form-encoded URI reference: `+` is a space, `%XX` a byte.
///
/// # Examples
///
/// ```
/// use eidas_core::formats::xml::url_decode;
///
/// assert_eq!(url_decode("umowa%20ko%C5%84cowa.pdf"), "umowa końcowa.pdf");
/// assert_eq!(url_decode("a+b.pdf"), "a b.pdf");
/// ```
#[must_use]
pub fn url_decode(uri: &str) -> String {
    let spaced = uri.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
