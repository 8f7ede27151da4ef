//! Test utilities: in-memory containers, XML fixtures and fake collaborators.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;
use std::sync::Mutex;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::Result;
use crate::VerifyError;
use crate::profile::Attachment;
use crate::profile::ProfileOutcome;
use crate::profile::TrustProfileService;
use crate::signature::Payload;
use crate::signature::RawResult;
use crate::signature::SignatureEngine;
use crate::signature::SignatureResult;
use crate::signature::ValidationPolicy;
use crate::trust::RevocationSources;
use crate::trust::TrustBuilder;
use crate::trust::TrustSnapshot;
use crate::trust::TrustVerifier;

/// Creates an in-memory ZIP archive from a list of entries.
///
/// Each entry is a tuple of (path, content). Files are stored uncompressed.
#[must_use]
pub fn create_test_zip(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    entries
        .into_iter()
        .fold(ZipTestBuilder::new(), |builder, (path, data)| {
            builder.add_file(path, data)
        })
        .build()
}

/// Builder for ZIP test archives with files and directories.
pub struct ZipTestBuilder {
    zip: zip::ZipWriter<Cursor<Vec<u8>>>,
    method: zip::CompressionMethod,
}

impl ZipTestBuilder {
    /// Creates a new ZIP test builder storing entries uncompressed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: zip::ZipWriter::new(Cursor::new(Vec::new())),
            method: zip::CompressionMethod::Stored,
        }
    }

    /// Deflates entries added after this call.
    #[must_use]
    pub fn deflated(mut self) -> Self {
        self.method = zip::CompressionMethod::Deflated;
        self
    }

    /// Adds a regular file to the archive.
    #[must_use]
    pub fn add_file(mut self, path: &str, data: &[u8]) -> Self {
        use zip::write::SimpleFileOptions;

        let options = SimpleFileOptions::default()
            .compression_method(self.method)
            .unix_permissions(0o644);

        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a directory to the archive.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        use zip::write::SimpleFileOptions;

        let options = SimpleFileOptions::default().unix_permissions(0o755);
        self.zip.add_directory(path, options).unwrap();
        self
    }

    /// Builds and returns the ZIP archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A government form (CRD namespace) embedding each payload in an `md5`
/// element.
#[must_use]
pub fn crd_form(payloads: &[&[u8]]) -> String {
    let attachments: String = payloads
        .iter()
        .map(|payload| format!("<zal:md5>{}</zal:md5>", STANDARD.encode(payload)))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wnio:Dokument xmlns:wnio="http://crd.gov.pl/wzor/2013/01/21/1086/" xmlns:zal="http://crd.gov.pl/xml/schematy/zalaczniki/">
  <wnio:Zalaczniki>{attachments}</wnio:Zalaczniki>
</wnio:Dokument>"#
    )
}

/// Builds a fake signature result with the given indication and signer.
#[must_use]
pub fn signature_result(indication: crate::Indication, signer: &str) -> SignatureResult {
    SignatureResult {
        indication,
        signed_by: signer.to_string(),
        level: "XAdES-BASELINE-B".to_string(),
        format: "XAdES-BASELINE-B".to_string(),
        subject_dn: format!("CN={signer}"),
        issuer_dn: "CN=Test CA".to_string(),
        digest_algorithm: "SHA256".to_string(),
        encryption_algorithm: "RSA".to_string(),
        serial_number: "1234".to_string(),
        key_usages: vec!["nonRepudiation".to_string()],
        ..SignatureResult::default()
    }
}

/// Recorded call to [`FakeEngine::validate`].
#[derive(Debug, Clone)]
pub struct ValidateCall {
    /// Validated payload.
    pub payload: Payload,
    /// Detached payloads.
    pub detached: Vec<Payload>,
    /// Policy used.
    pub policy: ValidationPolicy,
    /// Trust generation observed.
    pub generation: u64,
}

/// Signature engine returning a fixed result and recording calls.
#[derive(Default)]
pub struct FakeEngine {
    /// Result returned for every payload.
    pub result: RawResult,
    /// File names (last component) for which validation fails.
    pub failing: Vec<String>,
    /// Documents returned by content recovery.
    pub originals: Vec<Vec<u8>>,
    /// Recorded calls.
    pub calls: Mutex<Vec<ValidateCall>>,
}

impl FakeEngine {
    /// Creates an engine that reports the given signatures.
    #[must_use]
    pub fn with_signatures(signatures: Vec<SignatureResult>) -> Self {
        Self {
            result: RawResult::from_signatures(signatures),
            ..Self::default()
        }
    }

    /// Returns a copy of the recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<ValidateCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl SignatureEngine for FakeEngine {
    fn validate(
        &self,
        payload: &Payload,
        detached: &[Payload],
        policy: &ValidationPolicy,
        trust: &TrustSnapshot,
    ) -> Result<RawResult> {
        self.calls.lock().unwrap().push(ValidateCall {
            payload: payload.clone(),
            detached: detached.to_vec(),
            policy: policy.clone(),
            generation: trust.generation,
        });
        let name = payload
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.failing.contains(&name) {
            return Err(VerifyError::Engine(format!("cannot validate {name}")));
        }
        Ok(self.result.clone())
    }

    fn extract_original_documents(
        &self,
        _payload: &Payload,
        _signature_index: usize,
    ) -> Result<Vec<Vec<u8>>> {
        Ok(self.originals.clone())
    }
}

/// Trust-profile service returning a fixed outcome or failing.
pub struct FakeProfile {
    /// Outcome returned, or `None` to fail.
    pub outcome: Option<ProfileOutcome>,
    /// Attachment names seen per call.
    pub seen: Mutex<Vec<Vec<String>>>,
}

impl FakeProfile {
    /// Creates a service answering with `outcome`, or failing if `None`.
    #[must_use]
    pub fn new(outcome: Option<ProfileOutcome>) -> Self {
        Self {
            outcome,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl TrustProfileService for FakeProfile {
    fn confirm(&self, _document: &[u8], attachments: &[Attachment]) -> Result<ProfileOutcome> {
        self.seen
            .lock()
            .unwrap()
            .push(attachments.iter().map(|a| a.name.clone()).collect());
        self.outcome
            .clone()
            .ok_or_else(|| VerifyError::TrustProfile("service unavailable".into()))
    }
}

/// Trust builder producing an empty verifier.
pub struct StaticTrust;

impl TrustBuilder for StaticTrust {
    fn build(&self) -> Result<TrustVerifier> {
        Ok(TrustVerifier {
            keystore: None,
            keystore_password: String::new(),
            trusted_certificates: Vec::new(),
            revocation: RevocationSources {
                online_crl: false,
                online_ocsp: false,
            },
            lotl_url: String::new(),
            lotl_code: String::new(),
            cache_dir: std::env::temp_dir(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_zip() {
        let zip_data = create_test_zip(vec![("file.txt", b"hello")]);
        assert!(zip_data.starts_with(b"PK\x03\x04"));
    }

    #[test]
    fn test_zip_builder() {
        let zip_data = ZipTestBuilder::new()
            .add_file("file.txt", b"content")
            .add_directory("dir/")
            .build();
        let archive = zip::ZipArchive::new(Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn test_crd_form_is_well_formed() {
        let xml = crd_form(&[b"one", b"two"]);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let count = doc
            .descendants()
            .filter(|n| n.tag_name().name() == "md5")
            .count();
        assert_eq!(count, 2);
    }
}
