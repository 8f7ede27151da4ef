//! Trusted-profile confirmation.
//!
//! Polish administrative documents may be signed with a "trusted profile"
//! (profil zaufany) instead of a qualified certificate. Such signatures can
//! only be confirmed by the national service, so XML documents are optionally
//! sent there as a second opinion.

use serde::Serialize;

use crate::Result;
use crate::signature::Indication;

const VALID_SIGNATURE_VERDICT: &str = "Prawidłowy";

const VALID_WITH_PROFILE: &str =
    "Trusted profile validation: Valid signature with trusted profile.";
const VALID_WITHOUT_PROFILE: &str =
    "Trusted profile validation: Valid signature without trusted profile.";
const INVALID_WITH_PROFILE: &str =
    "Trusted profile validation: Signature is invalid, but it has a valid trusted profile.";
const INVALID_WITHOUT_PROFILE: &str =
    "Trusted profile validation: Signature is invalid, and it doesn't have a valid trusted profile.";
const UNREADABLE_RESPONSE: &str = "Trusted profile validation: There was a problem with reading xml response from pz.gov.pl service.";
const UNSUPPORTED: &str = "Trusted profile validation not supported, or there was a problem with trusted profile validation.";
const NOT_AN_XML: &str = "Not an xml - did not check for trusted profile.";

/// A detached document sent along with the signed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Bare file name, without directories.
    pub name: String,
    /// File content.
    pub content: Vec<u8>,
}

/// Verdict of the trusted-profile service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileResult {
    /// Valid signature backed by a trusted profile.
    TotalPassed,
    /// Not conclusive.
    Indeterminate,
    /// Invalid signature without a trusted profile.
    TotalFailed,
}

impl ProfileResult {
    /// Returns the equivalent signature indication.
    #[must_use]
    pub const fn indication(self) -> Indication {
        match self {
            Self::TotalPassed => Indication::TotalPassed,
            Self::Indeterminate => Indication::Indeterminate,
            Self::TotalFailed => Indication::TotalFailed,
        }
    }
}

/// Result and explanation returned by a trusted-profile check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileOutcome {
    /// Service verdict.
    pub result: ProfileResult,
    /// Human-readable explanation appended to the report.
    pub info: String,
}

impl ProfileOutcome {
    /// Builds the outcome for the service's two answers.
    ///
    /// # Examples
    ///
    /// ```
    /// use eidas_core::profile::{ProfileOutcome, ProfileResult};
    ///
    /// let outcome = ProfileOutcome::from_verdict(true, true);
    /// assert_eq!(outcome.result, ProfileResult::TotalPassed);
    ///
    /// let outcome = ProfileOutcome::from_verdict(false, true);
    /// assert_eq!(outcome.result, ProfileResult::Indeterminate);
    /// ```
    #[must_use]
    pub fn from_verdict(signature_valid: bool, profile_present: bool) -> Self {
        let (result, info) = match (signature_valid, profile_present) {
            (true, true) => (ProfileResult::TotalPassed, VALID_WITH_PROFILE),
            (true, false) => (ProfileResult::Indeterminate, VALID_WITHOUT_PROFILE),
            (false, true) => (ProfileResult::Indeterminate, INVALID_WITH_PROFILE),
            (false, false) => (ProfileResult::TotalFailed, INVALID_WITHOUT_PROFILE),
        };
        Self {
            result,
            info: info.to_string(),
        }
    }

    /// Outcome used when the service cannot be asked or the document cannot
    /// be checked.
    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            result: ProfileResult::Indeterminate,
            info: UNSUPPORTED.to_string(),
        }
    }

    /// Outcome recorded for documents that are not XML and so are never sent
    /// to the service.
    #[must_use]
    pub fn not_xml() -> Self {
        Self {
            result: ProfileResult::Indeterminate,
            info: NOT_AN_XML.to_string(),
        }
    }

    /// Outcome used when the service's answer cannot be read.
    #[must_use]
    pub fn unreadable_response() -> Self {
        Self {
            result: ProfileResult::Indeterminate,
            info: UNREADABLE_RESPONSE.to_string(),
        }
    }

    /// Returns `true` if the profile check confirms the signature.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.result == ProfileResult::TotalPassed
    }
}

/// Interprets the XML answer of the trusted-profile service.
///
/// The answer carries `ValidDocumentSignature/@znaczenie` (the signature
/// verdict) and `ZP/@czy_obecny` (whether a trusted profile is present).
/// When an element occurs more than once, the last occurrence wins.
#[must_use]
pub fn interpret_response(xml: &str) -> ProfileOutcome {
    let Ok(doc) = roxmltree::Document::parse(xml) else {
        return ProfileOutcome::unreadable_response();
    };

    let last_attribute = |element: &str, attribute: &str| {
        doc.descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == element)
            .filter_map(|node| node.attribute(attribute))
            .last()
    };

    let signature_valid =
        last_attribute("ValidDocumentSignature", "znaczenie") == Some(VALID_SIGNATURE_VERDICT);
    let profile_present = last_attribute("ZP", "czy_obecny") == Some("true");

    ProfileOutcome::from_verdict(signature_valid, profile_present)
}

/// External trusted-profile confirmation service.
pub trait TrustProfileService: Send + Sync {
    /// Asks the service to confirm the signature of `document`.
    fn confirm(&self, document: &[u8], attachments: &[Attachment]) -> Result<ProfileOutcome>;
}
