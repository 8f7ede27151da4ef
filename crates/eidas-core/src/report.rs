//! Validation report model.

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::config::ReportOptions;
use crate::signature::Indication;
use crate::signature::RawResult;
use crate::signature::SignatureEngine;
use crate::signature::SignatureResult;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %Z";
const SIGNING_KEY_USAGE: &str = "nonRepudiation";

/// Report for one discovered file.
///
/// Serializes with camelCase keys; absent sections are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// Root-relative path of the file.
    pub file_name: String,

    /// Root-relative paths of the detached documents the file signs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detached_files: Option<Vec<String>>,

    /// One entry per signature; absent for files that were not validated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_data: Option<Vec<CertificateEntry>>,

    /// Why validation failed, when the engine could not process the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

impl ReportEntry {
    /// Creates an entry carrying only the file name.
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    /// Returns the number of signatures reported for this file.
    #[must_use]
    pub fn signature_count(&self) -> usize {
        self.certificate_data.as_ref().map_or(0, Vec::len)
    }

    /// Returns whether the engine failed on this file.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.validation_error.is_some()
    }
}

/// Signer, certificate and verdict of one signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateEntry {
    /// Signature indication.
    pub validation: Indication,
    /// Sub-indication, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subvalidation: Option<String>,
    /// Claimed signing time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_date: Option<String>,
    /// Signer name.
    pub signed_by: String,
    /// Signature level.
    pub signature_level: String,
    /// Signature format.
    pub signature_format: String,
    /// `"<position> of <count>"`, 1-based.
    pub signature_number: String,
    /// Validation errors.
    pub errors: Vec<String>,
    /// Validation warnings.
    pub warnings: Vec<String>,
    /// Informational messages.
    pub info: Vec<String>,
    /// Timestamp production times; only for timestamp-bearing levels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Vec<String>>,
    /// Certificate subject.
    pub subject_distinguished_name: String,
    /// Certificate issuer.
    pub issuer_distinguished_name: String,
    /// `"<digest> with <encryption>"`.
    pub signature_algorithm: String,
    /// Certificate serial number.
    pub certificate_serial_number: String,
    /// `"from <not before> to <not after>"`.
    pub certificate_validity_period: String,
    /// `Yes` when the certificate allows non-repudiation, `No` otherwise.
    pub is_for_signing: String,
    /// Engine detailed report, flattened to one line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dss_detailed_report: Option<String>,
    /// Engine diagnostic data, flattened to one line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dss_diagnostic_report: Option<String>,
}

/// Turns engine results into certificate entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAssembler {
    options: ReportOptions,
}

impl ReportAssembler {
    /// Creates an assembler with the given raw-report inclusion flags.
    #[must_use]
    pub const fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Builds one certificate entry per signature in `raw`.
    #[must_use]
    pub fn certificates(
        &self,
        raw: &RawResult,
        engine: &dyn SignatureEngine,
    ) -> Vec<CertificateEntry> {
        let detailed = self
            .options
            .include_detailed_report
            .then(|| engine.detailed_report_text(raw))
            .flatten()
            .map(|text| flatten_report(&text));
        let diagnostic = self
            .options
            .include_diagnostic_report
            .then(|| engine.diagnostic_report_text(raw))
            .flatten()
            .map(|text| flatten_report(&text));

        raw.signatures
            .iter()
            .enumerate()
            .map(|(index, signature)| CertificateEntry {
                dss_detailed_report: detailed.clone(),
                dss_diagnostic_report: diagnostic.clone(),
                ..certificate(signature, index + 1, raw.signature_count)
            })
            .collect()
    }
}

fn certificate(signature: &SignatureResult, position: usize, count: usize) -> CertificateEntry {
    CertificateEntry {
        validation: signature.indication,
        subvalidation: signature.sub_indication.clone(),
        signing_date: signature.signing_time.as_ref().map(format_date),
        signed_by: signature.signed_by.clone(),
        signature_level: signature.level.clone(),
        signature_format: signature.format.clone(),
        signature_number: format!("{position} of {count}"),
        errors: signature.errors.clone(),
        warnings: signature.warnings.clone(),
        info: signature.info.clone(),
        timestamp: signature
            .has_timestamp_level
            .then(|| signature.timestamps.iter().map(format_date).collect()),
        subject_distinguished_name: signature.subject_dn.clone(),
        issuer_distinguished_name: signature.issuer_dn.clone(),
        signature_algorithm: format!(
            "{} with {}",
            signature.digest_algorithm, signature.encryption_algorithm
        ),
        certificate_serial_number: signature.serial_number.clone(),
        certificate_validity_period: format!(
            "from {} to {}",
            format_date(&signature.not_before),
            format_date(&signature.not_after)
        ),
        is_for_signing: if signature.key_usages.iter().any(|usage| usage == SIGNING_KEY_USAGE) {
            "Yes".to_string()
        } else {
            "No".to_string()
        },
        dss_detailed_report: None,
        dss_diagnostic_report: None,
    }
}

/// Formats a timestamp as `yyyy-MM-dd HH:mm:ss.SSS UTC`.
///
/// # Examples
///
/// ```
/// use chrono::TimeZone;
/// use chrono::Utc;
/// use eidas_core::report::format_date;
///
/// let time = Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap();
/// assert_eq!(format_date(&time), "2024-03-01 14:05:09.000 UTC");
/// ```
#[must_use]
pub fn format_date(time: &DateTime<Utc>) -> String {
    time.format(DATE_FORMAT).to_string()
}

/// Removes line breaks and turns double quotes into single quotes.
#[must_use]
pub fn flatten_report(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\n' | '\r'))
        .map(|c| if c == '"' { '\'' } else { c })
        .collect()
}
