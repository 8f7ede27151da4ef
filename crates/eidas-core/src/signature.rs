//! Interface of the external signature validation engine.
//!
//! The engine performs all cryptographic work: signature verification,
//! certificate-chain building and revocation checking. This crate only
//! decides what to hand it and turns its answers into report entries.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::Result;
use crate::trust::TrustSnapshot;

/// Opaque unit of work handed to the engine: a signed document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    path: PathBuf,
}

impl Payload {
    /// Creates a payload for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file backing this payload.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Validation policy the engine evaluates signatures against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// The service-wide default constraint file.
    Default(PathBuf),
    /// A policy uploaded with the request.
    Uploaded(PathBuf),
}

impl ValidationPolicy {
    /// Returns the policy file.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Default(path) | Self::Uploaded(path) => path,
        }
    }

    /// Returns `true` for a caller-supplied policy.
    #[must_use]
    pub const fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded(_))
    }
}

/// Top-level validation conclusion for one signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Indication {
    /// Every check passed.
    TotalPassed,
    /// Checks passed at the evaluated level.
    Passed,
    /// The engine could not reach a conclusion.
    #[default]
    Indeterminate,
    /// A check failed at the evaluated level.
    Failed,
    /// The signature is definitively invalid.
    TotalFailed,
    /// The document carries no signature.
    NoSignatureFound,
}

impl Indication {
    /// Returns the wire name of this indication.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TotalPassed => "TOTAL_PASSED",
            Self::Passed => "PASSED",
            Self::Indeterminate => "INDETERMINATE",
            Self::Failed => "FAILED",
            Self::TotalFailed => "TOTAL_FAILED",
            Self::NoSignatureFound => "NO_SIGNATURE_FOUND",
        }
    }
}

impl fmt::Display for Indication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine verdict and signer details for a single signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureResult {
    /// Validation indication.
    pub indication: Indication,
    /// Sub-indication, when the engine reports one.
    pub sub_indication: Option<String>,
    /// Claimed signing time.
    pub signing_time: Option<DateTime<Utc>>,
    /// Signer's display name.
    pub signed_by: String,
    /// Signature level, e.g. `XAdES-BASELINE-T`.
    pub level: String,
    /// Signature format, e.g. `XAdES-BASELINE-B`.
    pub format: String,
    /// Validation errors.
    pub errors: Vec<String>,
    /// Validation warnings.
    pub warnings: Vec<String>,
    /// Informational messages.
    pub info: Vec<String>,
    /// Whether the signature reaches a timestamp-bearing level.
    pub has_timestamp_level: bool,
    /// Production times of the signature's timestamps.
    pub timestamps: Vec<DateTime<Utc>>,
    /// Signing certificate subject DN.
    pub subject_dn: String,
    /// Signing certificate issuer DN.
    pub issuer_dn: String,
    /// Digest algorithm name.
    pub digest_algorithm: String,
    /// Encryption algorithm name.
    pub encryption_algorithm: String,
    /// Signing certificate serial number.
    pub serial_number: String,
    /// Start of the signing certificate's validity.
    pub not_before: DateTime<Utc>,
    /// End of the signing certificate's validity.
    pub not_after: DateTime<Utc>,
    /// Key usage flags of the signing certificate.
    pub key_usages: Vec<String>,
}

/// Everything the engine returns for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResult {
    /// Per-signature results in discovery order.
    pub signatures: Vec<SignatureResult>,
    /// Total number of signatures the engine found.
    pub signature_count: usize,
    /// Engine's detailed report, as text.
    pub detailed_report: Option<String>,
    /// Engine's diagnostic data, as text.
    pub diagnostic_report: Option<String>,
}

impl RawResult {
    /// Creates a result whose signature count matches the given signatures.
    #[must_use]
    pub fn from_signatures(signatures: Vec<SignatureResult>) -> Self {
        Self {
            signature_count: signatures.len(),
            signatures,
            detailed_report: None,
            diagnostic_report: None,
        }
    }
}

/// External signature validation engine.
pub trait SignatureEngine: Send + Sync {
    /// Validates the signatures in `payload`.
    ///
    /// `detached` lists the documents the signature covers that are stored
    /// outside it. `trust` is the snapshot captured at the start of the
    /// request.
    fn validate(
        &self,
        payload: &Payload,
        detached: &[Payload],
        policy: &ValidationPolicy,
        trust: &TrustSnapshot,
    ) -> Result<RawResult>;

    /// Recovers the documents covered by the signature at `signature_index`.
    fn extract_original_documents(
        &self,
        payload: &Payload,
        signature_index: usize,
    ) -> Result<Vec<Vec<u8>>>;

    /// Returns the detailed report text for a result.
    fn detailed_report_text(&self, result: &RawResult) -> Option<String> {
        result.detailed_report.clone()
    }

    /// Returns the diagnostic report text for a result.
    fn diagnostic_report_text(&self, result: &RawResult) -> Option<String> {
        result.diagnostic_report.clone()
    }
}
