//! Validation of every discovered file against the signature engine.

use std::fs;
use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::Result;
use crate::formats::ContainerFormat;
use crate::formats::ContainerParser;
use crate::formats::ParserSelector;
use crate::profile::Attachment;
use crate::profile::ProfileOutcome;
use crate::profile::TrustProfileService;
use crate::report::ReportAssembler;
use crate::report::ReportEntry;
use crate::signature::Indication;
use crate::signature::Payload;
use crate::signature::RawResult;
use crate::signature::SignatureEngine;
use crate::signature::ValidationPolicy;
use crate::trust::TrustSnapshot;
use crate::types::SignedItem;

/// Validates files one by one and builds their report entries.
///
/// Failures are contained per file: an engine error becomes that file's
/// `validationError`, a trust-profile failure becomes the fixed
/// "not supported" outcome.
pub struct ValidationOrchestrator {
    selector: ParserSelector,
    engine: Arc<dyn SignatureEngine>,
    profile: Option<Arc<dyn TrustProfileService>>,
    profile_enabled: bool,
    assembler: ReportAssembler,
}

impl std::fmt::Debug for ValidationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationOrchestrator")
            .field("selector", &self.selector)
            .field("profile", &self.profile.is_some())
            .field("profile_enabled", &self.profile_enabled)
            .field("assembler", &self.assembler)
            .finish_non_exhaustive()
    }
}

impl ValidationOrchestrator {
    /// Creates an orchestrator without trust-profile confirmation.
    #[must_use]
    pub fn new(
        selector: ParserSelector,
        engine: Arc<dyn SignatureEngine>,
        assembler: ReportAssembler,
    ) -> Self {
        Self {
            selector,
            engine,
            profile: None,
            profile_enabled: false,
            assembler,
        }
    }

    /// Enables trust-profile confirmation of XML documents.
    ///
    /// With `enabled` set and no service, every check reports the
    /// "not supported" outcome.
    #[must_use]
    pub fn with_trust_profile(
        mut self,
        service: Option<Arc<dyn TrustProfileService>>,
        enabled: bool,
    ) -> Self {
        self.profile = service;
        self.profile_enabled = enabled;
        self
    }

    /// Returns one report entry per file, in order.
    ///
    /// Detached documents are looked up among `files`.
    #[must_use]
    pub fn validate_files(
        &self,
        files: &[SignedItem],
        policy: &ValidationPolicy,
        trust: &TrustSnapshot,
    ) -> Vec<ReportEntry> {
        files
            .iter()
            .map(|file| self.validate_file(file, files, policy, trust))
            .collect()
    }

    fn validate_file(
        &self,
        file: &SignedItem,
        files: &[SignedItem],
        policy: &ValidationPolicy,
        trust: &TrustSnapshot,
    ) -> ReportEntry {
        let parser = self.selector.select(file);
        let mut entry = ReportEntry::new(file.file_name());
        let shown = file.relative_path();

        let detached = parser.detached_files(files);
        if !detached.is_empty() {
            entry.detached_files = Some(detached.iter().map(SignedItem::relative_path).collect());
        }

        let Some(payload) = parser.validation_payload() else {
            debug!(file = %shown, format = parser.format_name(), "nothing to validate");
            return entry;
        };

        let detached_payloads: Vec<Payload> =
            detached.iter().map(|item| Payload::new(item.path())).collect();

        match self
            .engine
            .validate(&payload, &detached_payloads, policy, trust)
        {
            Ok(mut raw) => {
                if self.profile_enabled {
                    let outcome = if parser.is_xml() {
                        self.confirm_profile(&parser, &detached)
                    } else {
                        ProfileOutcome::not_xml()
                    };
                    apply_profile_outcome(&mut raw, &outcome);
                }
                info!(
                    file = %shown,
                    signatures = raw.signatures.len(),
                    detached = detached.len(),
                    "file validated"
                );
                entry.certificate_data = Some(self.assembler.certificates(&raw, self.engine.as_ref()));
            }
            Err(err) => {
                if err.is_degradable() {
                    warn!(file = %shown, error = %err, "signature engine rejected file");
                } else {
                    error!(file = %shown, error = %err, "signature engine failed");
                }
                entry.certificate_data = Some(Vec::new());
                entry.validation_error = Some(err.to_string());
            }
        }

        entry
    }

    fn confirm_profile(&self, parser: &ContainerParser, detached: &[SignedItem]) -> ProfileOutcome {
        let Some(service) = &self.profile else {
            warn!("trust-profile validation enabled without a service");
            return ProfileOutcome::unsupported();
        };

        let outcome = read_profile_inputs(parser.file(), detached)
            .and_then(|(document, attachments)| service.confirm(&document, &attachments));

        match outcome {
            Ok(outcome) => {
                debug!(file = %parser.file().relative_path(), result = ?outcome.result, "trust profile checked");
                outcome
            }
            Err(err) => {
                warn!(file = %parser.file().relative_path(), error = %err, "trust-profile check failed");
                ProfileOutcome::unsupported()
            }
        }
    }
}

fn read_profile_inputs(
    file: &SignedItem,
    detached: &[SignedItem],
) -> Result<(Vec<u8>, Vec<Attachment>)> {
    let document = fs::read(file.path())?;
    let attachments = detached
        .iter()
        .map(|item| {
            Ok(Attachment {
                name: item.file_name(),
                content: fs::read(item.path())?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((document, attachments))
}

/// Folds a trust-profile outcome into the engine's result.
///
/// A passing outcome raises every signature to `TOTAL_PASSED`; other
/// outcomes never lower an indication. The outcome's explanation is added
/// to every signature's info list either way.
pub fn apply_profile_outcome(raw: &mut RawResult, outcome: &ProfileOutcome) {
    for signature in &mut raw.signatures {
        if outcome.is_pass() {
            signature.indication = Indication::TotalPassed;
        }
        signature.info.push(outcome.info.clone());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::formats::MagicClassifier;
    use crate::profile::ProfileResult;
    use crate::test_utils::FakeEngine;
    use crate::test_utils::FakeProfile;
    use crate::test_utils::StaticTrust;
    use crate::test_utils::signature_result;
    use crate::trust::TrustStore;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, name: &str, bytes: &[u8]) -> SignedItem {
        let path = root.join(name);
        fs::write(&path, bytes).unwrap();
        SignedItem::new(path, root)
    }

    fn snapshot() -> Arc<TrustSnapshot> {
        TrustStore::initialize(Box::new(StaticTrust)).unwrap().snapshot()
    }

    fn orchestrator(engine: Arc<FakeEngine>) -> ValidationOrchestrator {
        ValidationOrchestrator::new(
            ParserSelector::new(Arc::new(MagicClassifier), None),
            engine,
            ReportAssembler::default(),
        )
    }

    fn policy() -> ValidationPolicy {
        ValidationPolicy::Default("constraint.xml".into())
    }

    fn passing_engine() -> Arc<FakeEngine> {
        Arc::new(FakeEngine::with_signatures(vec![signature_result(
            Indication::Indeterminate,
            "Jan Kowalski",
        )]))
    }

    #[test]
    fn test_pdf_is_validated() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let file = write(temp.path(), "doc.pdf", b"%PDF-1.4");
        let engine = passing_engine();

        let entries = orchestrator(engine.clone()).validate_files(&[file], &policy(), &snapshot());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "doc.pdf");
        assert!(entries[0].detached_files.is_none());
        assert_eq!(entries[0].signature_count(), 1);
        assert_eq!(engine.calls().len(), 1);
        assert_eq!(engine.calls()[0].generation, 1);
    }

    #[test]
    fn test_file_without_payload_has_no_certificates() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let file = write(temp.path(), "notes.txt", b"plain");
        let engine = passing_engine();

        let entries = orchestrator(engine.clone()).validate_files(&[file], &policy(), &snapshot());

        assert!(entries[0].certificate_data.is_none());
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_detached_documents_are_passed_to_engine() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = temp.path();
        let document = write(root, "doc.pdf", b"%PDF-1.4");
        let signature = write(root, "doc.pdf.xades", b"<Signature/>");
        let engine = passing_engine();

        let entries = orchestrator(engine.clone()).validate_files(
            &[document, signature],
            &policy(),
            &snapshot(),
        );

        assert_eq!(entries[1].detached_files, Some(vec!["doc.pdf".to_string()]));
        let calls = engine.calls();
        assert_eq!(calls[1].detached, vec![Payload::new(root.join("doc.pdf"))]);
    }

    #[test]
    fn test_engine_error_is_reported_per_file() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let broken = write(temp.path(), "broken.pdf", b"%PDF-1.4");
        let fine = write(temp.path(), "fine.pdf", b"%PDF-1.4");
        let mut engine = FakeEngine::with_signatures(vec![signature_result(Indication::Passed, "A")]);
        engine.failing = vec!["broken.pdf".into()];

        let entries =
            orchestrator(Arc::new(engine)).validate_files(&[broken, fine], &policy(), &snapshot());

        assert_eq!(entries[0].certificate_data, Some(Vec::new()));
        assert!(entries[0].validation_error.as_deref().unwrap().contains("broken.pdf"));
        assert_eq!(entries[1].signature_count(), 1);
        assert!(!entries[1].has_error());
    }

    #[test]
    fn test_profile_pass_overrides_indication() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let file = write(temp.path(), "form.xml", b"<a/>");
        let profile = Arc::new(FakeProfile::new(Some(ProfileOutcome::from_verdict(true, true))));

        let entries = orchestrator(passing_engine())
            .with_trust_profile(Some(profile), true)
            .validate_files(&[file], &policy(), &snapshot());

        let certificate = &entries[0].certificate_data.as_ref().unwrap()[0];
        assert_eq!(certificate.validation, Indication::TotalPassed);
        assert_eq!(
            certificate.info.last().unwrap(),
            "Trusted profile validation: Valid signature with trusted profile."
        );
    }

    #[test]
    fn test_profile_failure_never_downgrades() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let file = write(temp.path(), "form.xml", b"<a/>");
        let engine = Arc::new(FakeEngine::with_signatures(vec![signature_result(
            Indication::TotalPassed,
            "A",
        )]));
        let profile = Arc::new(FakeProfile::new(Some(ProfileOutcome::from_verdict(false, false))));

        let entries = orchestrator(engine)
            .with_trust_profile(Some(profile), true)
            .validate_files(&[file], &policy(), &snapshot());

        let certificate = &entries[0].certificate_data.as_ref().unwrap()[0];
        assert_eq!(certificate.validation, Indication::TotalPassed);
        assert_eq!(certificate.info.len(), 1);
    }

    #[test]
    fn test_profile_service_error_degrades_to_unsupported() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let file = write(temp.path(), "form.xml", b"<a/>");
        let profile = Arc::new(FakeProfile::new(None));

        let entries = orchestrator(passing_engine())
            .with_trust_profile(Some(profile), true)
            .validate_files(&[file], &policy(), &snapshot());

        let certificate = &entries[0].certificate_data.as_ref().unwrap()[0];
        assert_eq!(certificate.validation, Indication::Indeterminate);
        assert_eq!(certificate.info, vec![ProfileOutcome::unsupported().info]);
    }

    #[test]
    fn test_profile_only_for_xml() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let file = write(temp.path(), "doc.pdf", b"%PDF-1.4");
        let profile = Arc::new(FakeProfile::new(Some(ProfileOutcome::from_verdict(true, true))));

        let entries = orchestrator(passing_engine())
            .with_trust_profile(Some(profile.clone()), true)
            .validate_files(&[file], &policy(), &snapshot());

        let certificate = &entries[0].certificate_data.as_ref().unwrap()[0];
        assert_eq!(certificate.validation, Indication::Indeterminate);
        assert_eq!(
            certificate.info,
            vec!["Not an xml - did not check for trusted profile.".to_string()]
        );
        assert!(profile.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_non_xml_note_keeps_passing_indication() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let file = write(temp.path(), "doc.pdf", b"%PDF-1.4");
        let engine = Arc::new(FakeEngine::with_signatures(vec![signature_result(
            Indication::TotalPassed,
            "A",
        )]));

        let entries = orchestrator(engine)
            .with_trust_profile(None, true)
            .validate_files(&[file], &policy(), &snapshot());

        let certificate = &entries[0].certificate_data.as_ref().unwrap()[0];
        assert_eq!(certificate.validation, Indication::TotalPassed);
        assert_eq!(certificate.info, vec![ProfileOutcome::not_xml().info]);
    }

    #[test]
    fn test_nested_file_reports_bare_name() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = temp.path();
        fs::create_dir_all(root.join("bundle/scans")).unwrap();
        let document = write(root, "bundle/scans/doc.pdf", b"%PDF-1.4");
        let signature = write(root, "bundle/scans/doc.pdf.xades", b"<Signature/>");
        let profile = Arc::new(FakeProfile::new(Some(ProfileOutcome::unsupported())));

        let entries = orchestrator(passing_engine())
            .with_trust_profile(Some(profile.clone()), true)
            .validate_files(&[document, signature], &policy(), &snapshot());

        assert_eq!(entries[0].file_name, "doc.pdf");
        assert_eq!(entries[1].file_name, "doc.pdf.xades");
        assert_eq!(
            entries[1].detached_files,
            Some(vec!["bundle/scans/doc.pdf".to_string()])
        );
        assert_eq!(*profile.seen.lock().unwrap(), vec![vec!["doc.pdf".to_string()]]);
    }

    #[test]
    fn test_profile_disabled() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let file = write(temp.path(), "form.xml", b"<a/>");
        let profile = Arc::new(FakeProfile::new(Some(ProfileOutcome::from_verdict(true, true))));

        let entries = orchestrator(passing_engine())
            .with_trust_profile(Some(profile.clone()), false)
            .validate_files(&[file], &policy(), &snapshot());

        let certificate = &entries[0].certificate_data.as_ref().unwrap()[0];
        assert_eq!(certificate.validation, Indication::Indeterminate);
        assert!(certificate.info.is_empty());
        assert!(profile.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_profile_receives_detached_attachments() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = temp.path();
        let document = write(root, "doc.pdf", b"%PDF-1.4");
        let signature = write(root, "doc.pdf.xades", b"<Signature/>");
        let profile = Arc::new(FakeProfile::new(Some(ProfileOutcome {
            result: ProfileResult::Indeterminate,
            info: "checked".into(),
        })));

        orchestrator(passing_engine())
            .with_trust_profile(Some(profile.clone()), true)
            .validate_files(&[document, signature], &policy(), &snapshot());

        assert_eq!(*profile.seen.lock().unwrap(), vec![vec!["doc.pdf".to_string()]]);
    }

    #[test]
    fn test_apply_profile_outcome() {
        let mut raw = RawResult::from_signatures(vec![
            signature_result(Indication::TotalFailed, "A"),
            signature_result(Indication::Indeterminate, "B"),
        ]);
        apply_profile_outcome(&mut raw, &ProfileOutcome::from_verdict(true, true));

        assert!(raw.signatures.iter().all(|s| s.indication == Indication::TotalPassed));
        assert!(raw.signatures.iter().all(|s| s.info.len() == 1));
    }
}
