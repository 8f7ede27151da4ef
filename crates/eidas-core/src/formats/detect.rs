//! Content-based format classification.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

/// Number of leading bytes inspected when classifying a file.
pub const CLASSIFY_WINDOW: u64 = 64 * 1024;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// DER encoding of the PKCS#7 signedData OID (1.2.840.113549.1.7.2).
const SIGNED_DATA_OID: &[u8] = &[
    0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02,
];

/// Classified content type of a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// Detached or enveloping CMS/PKCS#7 signature.
    Pkcs7Signature,
    /// PDF document.
    Pdf,
    /// XML document.
    Xml,
    /// ZIP container (including ASiC).
    Zip,
    /// Anything else, carrying the classifier's subtype token.
    Other(String),
}

impl FormatKind {
    /// Token used for content the classifier cannot identify.
    pub const UNKNOWN_SUBTYPE: &'static str = "octet-stream";

    /// Returns the kind used for unidentified content.
    #[must_use]
    pub fn unknown() -> Self {
        Self::Other(Self::UNKNOWN_SUBTYPE.to_string())
    }

    /// Maps a MIME subtype token to a format kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use eidas_core::formats::FormatKind;
    ///
    /// assert_eq!(FormatKind::from_subtype("pdf"), FormatKind::Pdf);
    /// assert_eq!(FormatKind::from_subtype("PKCS7-Signature"), FormatKind::Pkcs7Signature);
    /// assert_eq!(
    ///     FormatKind::from_subtype("plain"),
    ///     FormatKind::Other("plain".to_string())
    /// );
    /// ```
    #[must_use]
    pub fn from_subtype(subtype: &str) -> Self {
        match subtype.to_ascii_lowercase().as_str() {
            "pkcs7-signature" => Self::Pkcs7Signature,
            "pdf" => Self::Pdf,
            "xml" => Self::Xml,
            "zip" => Self::Zip,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the MIME subtype token of this kind.
    #[must_use]
    pub fn subtype(&self) -> &str {
        match self {
            Self::Pkcs7Signature => "pkcs7-signature",
            Self::Pdf => "pdf",
            Self::Xml => "xml",
            Self::Zip => "zip",
            Self::Other(subtype) => subtype,
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subtype())
    }
}

/// Classifies raw bytes into a format kind.
///
/// Implementations must be total: empty or unrecognizable input yields an
/// "unknown" kind rather than an error.
pub trait FormatClassifier: Send + Sync {
    /// Classifies the given leading bytes of a file.
    fn classify(&self, bytes: &[u8]) -> FormatKind;
}

/// Classifier based on magic bytes and leading markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicClassifier;

impl FormatClassifier for MagicClassifier {
    fn classify(&self, bytes: &[u8]) -> FormatKind {
        if bytes.starts_with(b"%PDF-") {
            FormatKind::Pdf
        } else if is_zip(bytes) {
            FormatKind::Zip
        } else if is_pkcs7(bytes) {
            FormatKind::Pkcs7Signature
        } else if is_xml(bytes) {
            FormatKind::Xml
        } else {
            FormatKind::unknown()
        }
    }
}

fn is_zip(bytes: &[u8]) -> bool {
    [b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"]
        .iter()
        .any(|magic| bytes.starts_with(*magic))
}

fn is_pkcs7(bytes: &[u8]) -> bool {
    let text = skip_whitespace(bytes);
    if text.starts_with(b"-----BEGIN PKCS7-----") || text.starts_with(b"-----BEGIN CMS-----") {
        return true;
    }

    // ContentInfo ::= SEQUENCE { contentType OID, ... }
    if bytes.first() != Some(&0x30) {
        return false;
    }
    let head = &bytes[..bytes.len().min(32)];
    head.windows(SIGNED_DATA_OID.len())
        .any(|window| window == SIGNED_DATA_OID)
}

fn is_xml(bytes: &[u8]) -> bool {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let bytes = skip_whitespace(bytes);
    if bytes.starts_with(b"<?xml") || bytes.starts_with(b"<!--") {
        return true;
    }
    match bytes {
        [b'<', first, ..] => is_name_start(*first),
        _ => false,
    }
}

fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || matches!(byte, b'_' | b':') || byte >= 0x80
}

fn skip_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Classifies a file from its first [`CLASSIFY_WINDOW`] bytes.
///
/// A file that cannot be read is classified as if it were empty.
pub fn classify_file(classifier: &dyn FormatClassifier, path: &Path) -> FormatKind {
    match read_window(path) {
        Ok(head) => classifier.classify(&head),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "cannot read file for classification");
            classifier.classify(&[])
        }
    }
}

fn read_window(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::new();
    File::open(path)?.take(CLASSIFY_WINDOW).read_to_end(&mut head)?;
    Ok(head)
}
