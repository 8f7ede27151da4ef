//! Attachments embedded in XML documents.
//!
//! Polish e-government forms carry their attachments inline, base64-encoded.
//! Where they live depends on the document's root namespace:
//!
//! - CRD form templates (`http://crd.gov.pl/wzor/...`): every `md5` element
//! - XML-DSig enveloping signatures: every base64-encoded `Object`
//! - anything else: `DaneZalacznika` elements of the CRD structure schema
//!   whose parent declares `kodowanie="base64"` and names the file

use std::path::Path;
use std::path::PathBuf;

use roxmltree::Document;
use roxmltree::Node;
use tracing::debug;
use tracing::warn;

use super::common;
use crate::types::SignedItem;

/// CRD form template namespaces whose attachments live in `md5` elements.
pub const CRD_FORM_NAMESPACES: [&str; 2] = [
    "http://crd.gov.pl/wzor/2013/01/21/1086/",
    "http://crd.gov.pl/wzor/2014/02/03/1495/",
];

/// Namespace prefix of the CRD attachment structure schema.
pub const CRD_STRUCTURE_PREFIX: &str = "http://crd.gov.pl/xml/schematy/struktura/";

/// XML-DSig namespace.
pub const XMLDSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";

/// `Encoding` value of a base64-encoded XML-DSig `Object`.
pub const XMLDSIG_BASE64_ENCODING: &str = "http://www.w3.org/2000/09/xmldsig#base64";

const MD5_ELEMENT: &str = "md5";
const OBJECT_ELEMENT: &str = "Object";
const ATTACHMENT_DATA_ELEMENT: &str = "DaneZalacznika";
const ENCODING_ATTRIBUTE: &str = "Encoding";
const STRUCTURE_ENCODING_ATTRIBUTE: &str = "kodowanie";
const STRUCTURE_FILENAME_ATTRIBUTE: &str = "nazwaPliku";
const BASE64: &str = "base64";

/// Strategy chosen from the document's root namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentLayout {
    /// CRD form template.
    CrdForm,
    /// XML-DSig enveloping signature.
    XmlDsig,
    /// CRD attachment structure or unknown.
    Structure,
}

impl AttachmentLayout {
    /// Picks the layout for a root element namespace.
    #[must_use]
    pub fn for_namespace(namespace: Option<&str>) -> Self {
        match namespace {
            Some(ns) if CRD_FORM_NAMESPACES.contains(&ns) => Self::CrdForm,
            Some(XMLDSIG_NAMESPACE) => Self::XmlDsig,
            _ => Self::Structure,
        }
    }
}

/// Base64 text bound for a file name.
struct PlannedAttachment {
    target: PathBuf,
    encoded: String,
}

/// Writes every attachment embedded in `doc` next to `source` and returns
/// the files that exist afterwards.
///
/// Undecodable attachments are skipped; the others are still written.
#[must_use]
pub fn extract_attachments(doc: &Document<'_>, source: &SignedItem) -> Vec<SignedItem> {
    let layout = AttachmentLayout::for_namespace(doc.root_element().tag_name().namespace());
    debug!(path = %source.path().display(), ?layout, "scanning for embedded attachments");

    let planned = match layout {
        AttachmentLayout::CrdForm => plan_numbered(doc, source, |node| {
            node.tag_name().name() == MD5_ELEMENT
        }),
        AttachmentLayout::XmlDsig => plan_dsig_objects(doc, source),
        AttachmentLayout::Structure => plan_structure(doc, source),
    };

    planned
        .into_iter()
        .filter_map(|attachment| materialize(&attachment, source))
        .collect()
}

fn materialize(attachment: &PlannedAttachment, source: &SignedItem) -> Option<SignedItem> {
    if attachment.target == source.path() {
        warn!(target = %attachment.target.display(), "attachment would overwrite its document");
        return None;
    }
    let content = match common::decode_base64(&attachment.encoded) {
        Ok(content) => content,
        Err(err) => {
            warn!(target = %attachment.target.display(), error = %err, "skipping undecodable attachment");
            return None;
        }
    };
    if let Err(err) = common::write_attachment(&attachment.target, &content) {
        warn!(target = %attachment.target.display(), error = %err, "cannot write attachment");
        return None;
    }
    attachment
        .target
        .is_file()
        .then(|| SignedItem::extracted_from(&attachment.target, source))
}

/// `Zal<ordinal><document name without extension>` next to the document.
fn numbered_name(source: &SignedItem, ordinal: usize) -> PathBuf {
    let stem = attachment_stem(source.path());
    source.parent_dir().join(format!("Zal{ordinal}{stem}"))
}

fn plan_numbered(
    doc: &Document<'_>,
    source: &SignedItem,
    matches: impl Fn(&Node<'_, '_>) -> bool,
) -> Vec<PlannedAttachment> {
    doc.descendants()
        .filter(|node| node.is_element() && matches(node))
        .enumerate()
        .map(|(ordinal, node)| PlannedAttachment {
            target: numbered_name(source, ordinal),
            encoded: text_content(&node),
        })
        .collect()
}

fn plan_dsig_objects(doc: &Document<'_>, source: &SignedItem) -> Vec<PlannedAttachment> {
    // Ordinals count every Object, including the ones that are skipped.
    doc.descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == OBJECT_ELEMENT)
        .enumerate()
        .filter(|(_, node)| node.attribute(ENCODING_ATTRIBUTE) == Some(XMLDSIG_BASE64_ENCODING))
        .map(|(ordinal, node)| PlannedAttachment {
            target: numbered_name(source, ordinal),
            encoded: text_content(&node),
        })
        .collect()
}

fn plan_structure(doc: &Document<'_>, source: &SignedItem) -> Vec<PlannedAttachment> {
    doc.descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == ATTACHMENT_DATA_ELEMENT)
        .filter(|node| {
            node.tag_name()
                .namespace()
                .is_some_and(|ns| ns.starts_with(CRD_STRUCTURE_PREFIX))
        })
        .filter_map(|node| {
            let parent = node.parent_element()?;
            if parent.attribute(STRUCTURE_ENCODING_ATTRIBUTE) != Some(BASE64) {
                return None;
            }
            let Some(name) = parent.attribute(STRUCTURE_FILENAME_ATTRIBUTE) else {
                warn!("structured attachment without a file name");
                return None;
            };
            let target = common::resolve_within(source.parent_dir(), source.root(), name)?;
            Some(PlannedAttachment {
                target,
                encoded: text_content(&node).trim().to_string(),
            })
        })
        .collect()
}

/// Concatenated text of all descendant text nodes.
pub(crate) fn text_content(node: &Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|text| text.text())
        .collect()
}

/// Returns the base name used for numbered attachments of `path`.
#[must_use]
pub fn attachment_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
