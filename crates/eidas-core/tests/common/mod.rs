//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::io::Cursor;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use eidas_core::Indication;
use eidas_core::Result;
use eidas_core::ServiceConfig;
use eidas_core::SignatureEngine;
use eidas_core::VerificationService;
use eidas_core::VerifyError;
use eidas_core::profile::Attachment;
use eidas_core::profile::ProfileOutcome;
use eidas_core::profile::TrustProfileService;
use eidas_core::signature::Payload;
use eidas_core::signature::RawResult;
use eidas_core::signature::SignatureResult;
use eidas_core::signature::ValidationPolicy;
use eidas_core::trust::RevocationSources;
use eidas_core::trust::TrustBuilder;
use eidas_core::trust::TrustSnapshot;
use eidas_core::trust::TrustStore;
use eidas_core::trust::TrustVerifier;
use zip::write::SimpleFileOptions;

pub const PDF: &[u8] = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";

/// Builds a stored ZIP archive from `(name, content)` pairs.
pub fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }
    zip.finish().unwrap().into_inner()
}

/// A CRD form with one `md5` attachment per payload.
pub fn crd_form(payloads: &[&[u8]]) -> String {
    let attachments: String = payloads
        .iter()
        .map(|payload| format!("<zal:md5>{}</zal:md5>", STANDARD.encode(payload)))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wnio:Dokument xmlns:wnio="http://crd.gov.pl/wzor/2014/02/03/1495/" xmlns:zal="http://crd.gov.pl/xml/schematy/zalaczniki/">
  <wnio:Zalaczniki>{attachments}</wnio:Zalaczniki>
</wnio:Dokument>"#
    )
}

pub fn signature(indication: Indication, signer: &str) -> SignatureResult {
    SignatureResult {
        indication,
        signed_by: signer.to_string(),
        level: "PAdES-BASELINE-B".to_string(),
        format: "PAdES-BASELINE-B".to_string(),
        subject_dn: format!("CN={signer},C=PL"),
        issuer_dn: "CN=Test Qualified CA,C=PL".to_string(),
        digest_algorithm: "SHA256".to_string(),
        encryption_algorithm: "RSA".to_string(),
        serial_number: "42".to_string(),
        key_usages: vec!["nonRepudiation".to_string()],
        ..SignatureResult::default()
    }
}

/// One recorded engine call.
#[derive(Debug, Clone)]
pub struct Call {
    pub payload: String,
    pub detached: Vec<String>,
    pub policy: ValidationPolicy,
    pub generation: u64,
    pub lotl_code: String,
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Engine returning one fixed result for every payload.
#[derive(Default)]
pub struct FakeEngine {
    pub signatures: Vec<SignatureResult>,
    pub failing: Vec<String>,
    pub originals: Vec<Vec<u8>>,
    /// Refreshed in the middle of every validation call, when set.
    pub refresh_during_call: OnceLock<Arc<TrustStore>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeEngine {
    pub fn signing(signatures: Vec<SignatureResult>) -> Self {
        Self {
            signatures,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
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
        if let Some(store) = self.refresh_during_call.get() {
            store.refresh().unwrap();
        }
        let name = file_name(payload.path());
        self.calls.lock().unwrap().push(Call {
            payload: name.clone(),
            detached: detached.iter().map(|d| file_name(d.path())).collect(),
            policy: policy.clone(),
            generation: trust.generation,
            lotl_code: trust.verifier.lotl_code.clone(),
        });
        if self.failing.contains(&name) {
            return Err(VerifyError::Engine(format!("{name}: unsupported signature format")));
        }
        Ok(RawResult::from_signatures(self.signatures.clone()))
    }

    fn extract_original_documents(
        &self,
        _payload: &Payload,
        _signature_index: usize,
    ) -> Result<Vec<Vec<u8>>> {
        Ok(self.originals.clone())
    }
}

/// Trust-profile service with a fixed answer; `None` fails every call.
pub struct FakeProfile {
    pub outcome: Option<ProfileOutcome>,
    pub calls: AtomicU64,
}

impl FakeProfile {
    pub fn new(outcome: Option<ProfileOutcome>) -> Self {
        Self {
            outcome,
            calls: AtomicU64::new(0),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TrustProfileService for FakeProfile {
    fn confirm(&self, _document: &[u8], _attachments: &[Attachment]) -> Result<ProfileOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .clone()
            .ok_or_else(|| VerifyError::TrustProfile("connection refused".into()))
    }
}

/// Trust builder tagging each verifier with its build number.
#[derive(Default)]
pub struct CountingTrust {
    builds: AtomicU64,
}

impl TrustBuilder for CountingTrust {
    fn build(&self) -> Result<TrustVerifier> {
        let build = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TrustVerifier {
            keystore: None,
            keystore_password: String::new(),
            trusted_certificates: Vec::new(),
            revocation: RevocationSources {
                online_crl: false,
                online_ocsp: false,
            },
            lotl_url: String::new(),
            lotl_code: format!("build-{build}"),
            cache_dir: PathBuf::from("cache"),
        })
    }
}

pub fn service_with(
    config: ServiceConfig,
    engine: Arc<FakeEngine>,
    profile: Option<Arc<FakeProfile>>,
) -> VerificationService {
    let mut builder = VerificationService::builder()
        .config(config)
        .engine(engine)
        .trust_builder(Box::new(CountingTrust::default()));
    if let Some(profile) = profile {
        builder = builder.trust_profile(profile);
    }
    builder.build().expect("service should build")
}
