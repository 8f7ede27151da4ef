//! Request entry point.

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use crate::Result;
use crate::ServiceConfig;
use crate::VerifyError;
use crate::Workspace;
use crate::extraction::ExtractionEngine;
use crate::formats::FormatClassifier;
use crate::formats::MagicClassifier;
use crate::formats::ParserSelector;
use crate::formats::xml;
use crate::profile::TrustProfileService;
use crate::report::ReportAssembler;
use crate::report::ReportEntry;
use crate::signature::SignatureEngine;
use crate::signature::ValidationPolicy;
use crate::trust::KeystoreTrustBuilder;
use crate::trust::RefreshTask;
use crate::trust::TrustBuilder;
use crate::trust::TrustStore;
use crate::validation::ValidationOrchestrator;

/// Validates uploaded documents and everything nested in them.
///
/// The service is `Send + Sync`; share it through an `Arc` and call
/// [`validate`](Self::validate) from as many threads as needed. Each call
/// works in its own [`Workspace`] and sees one trust snapshot throughout.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use eidas_core::ServiceConfig;
/// use eidas_core::VerificationService;
/// # use eidas_core::signature::SignatureEngine;
///
/// # fn run(engine: Arc<dyn SignatureEngine>) -> eidas_core::Result<()> {
/// let service = VerificationService::builder()
///     .config(ServiceConfig::default().with_max_nesting_depth(2))
///     .engine(engine)
///     .build()?;
/// let _refresh = service.start_refresh()?;
///
/// let report = service.validate(&std::fs::read("contract.pdf")?, "contract.pdf", None)?;
/// println!("{} files validated", report.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct VerificationService {
    config: ServiceConfig,
    extraction: ExtractionEngine,
    orchestrator: ValidationOrchestrator,
    trust: Arc<TrustStore>,
}

impl VerificationService {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> VerificationServiceBuilder {
        VerificationServiceBuilder::new()
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns the shared trust store.
    #[must_use]
    pub fn trust_store(&self) -> &Arc<TrustStore> {
        &self.trust
    }

    /// Validates an upload and returns one report entry per discovered file.
    ///
    /// `policy` is used when it is well-formed XML; otherwise the configured
    /// default policy applies. The top-level file comes first in the report.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::EmptyUpload` for an empty upload, and an error
    /// if no workspace can be created or the upload cannot be stored.
    /// Failures inside individual files are reported in their entries.
    pub fn validate(
        &self,
        upload: &[u8],
        upload_name: &str,
        policy: Option<&[u8]>,
    ) -> Result<Vec<ReportEntry>> {
        if upload.is_empty() {
            return Err(VerifyError::EmptyUpload);
        }

        let trust = self.trust.snapshot();
        let workspace = Workspace::create(&self.config.temp_dir, self.config.keep_workspace)?;
        let policy = self.resolve_policy(&workspace, policy)?;
        let top = workspace.write_upload(upload_name, upload)?;
        info!(
            upload = %top.relative_path(),
            bytes = upload.len(),
            trust_generation = trust.generation,
            policy = %policy.path().display(),
            "validation started"
        );

        let files = self.extraction.list_all_files(&top);
        let report = self.orchestrator.validate_files(&files, &policy, &trust);

        info!(upload = %top.relative_path(), files = report.len(), "validation finished");
        Ok(report)
    }

    /// Like [`validate`](Self::validate), serialized as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`validate`](Self::validate).
    pub fn validate_json(
        &self,
        upload: &[u8],
        upload_name: &str,
        policy: Option<&[u8]>,
    ) -> Result<String> {
        let report = self.validate(upload, upload_name, policy)?;
        serde_json::to_string(&report).map_err(|err| VerifyError::Io(err.into()))
    }

    /// Starts refreshing trust material on the configured schedule.
    ///
    /// Refreshing stops when the returned task is stopped or dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh thread cannot be started.
    pub fn start_refresh(&self) -> Result<RefreshTask> {
        RefreshTask::spawn(Arc::clone(&self.trust), self.config.trust.refresh_interval())
    }

    fn resolve_policy(
        &self,
        workspace: &Workspace,
        uploaded: Option<&[u8]>,
    ) -> Result<ValidationPolicy> {
        match uploaded {
            Some(bytes) if is_well_formed_xml(bytes) => {
                Ok(ValidationPolicy::Uploaded(workspace.write_policy(bytes)?))
            }
            Some(_) => {
                info!("uploaded policy is not XML, using default policy");
                Ok(self.default_policy())
            }
            None => {
                debug!("no policy uploaded, using default policy");
                Ok(self.default_policy())
            }
        }
    }

    fn default_policy(&self) -> ValidationPolicy {
        ValidationPolicy::Default(self.config.default_policy.clone())
    }
}

fn is_well_formed_xml(bytes: &[u8]) -> bool {
    xml::decode_source(bytes).is_ok_and(|text| xml::parse(&text).is_ok())
}

/// Builder for [`VerificationService`].
///
/// Only the signature engine is required. The classifier defaults to
/// [`MagicClassifier`] and trust material is loaded by a
/// [`KeystoreTrustBuilder`] over the configured [`TrustConfig`](crate::config::TrustConfig).
#[derive(Default)]
pub struct VerificationServiceBuilder {
    config: Option<ServiceConfig>,
    classifier: Option<Arc<dyn FormatClassifier>>,
    engine: Option<Arc<dyn SignatureEngine>>,
    profile: Option<Arc<dyn TrustProfileService>>,
    trust_builder: Option<Box<dyn TrustBuilder>>,
}

impl VerificationServiceBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the content classifier.
    #[must_use]
    pub fn classifier(mut self, classifier: Arc<dyn FormatClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Sets the signature engine.
    #[must_use]
    pub fn engine(mut self, engine: Arc<dyn SignatureEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the trust-profile confirmation service.
    #[must_use]
    pub fn trust_profile(mut self, service: Arc<dyn TrustProfileService>) -> Self {
        self.profile = Some(service);
        self
    }

    /// Replaces the trust material loader.
    #[must_use]
    pub fn trust_builder(mut self, builder: Box<dyn TrustBuilder>) -> Self {
        self.trust_builder = Some(builder);
        self
    }

    /// Loads the initial trust material and returns a ready service.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::Config` if no engine is set or the
    /// configuration is invalid, and the trust builder's error if the
    /// initial trust material cannot be loaded.
    pub fn build(self) -> Result<VerificationService> {
        let engine = self
            .engine
            .ok_or_else(|| VerifyError::Config("signature engine not set".into()))?;
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let classifier = self
            .classifier
            .unwrap_or_else(|| Arc::new(MagicClassifier));
        let trust_builder = self
            .trust_builder
            .unwrap_or_else(|| Box::new(KeystoreTrustBuilder::new(config.trust.clone())));
        let trust = Arc::new(TrustStore::initialize(trust_builder)?);

        let selector = ParserSelector::new(classifier, Some(Arc::clone(&engine)));
        let extraction = ExtractionEngine::new(selector.clone(), config.max_nesting_depth);
        let orchestrator =
            ValidationOrchestrator::new(selector, engine, ReportAssembler::new(config.report))
                .with_trust_profile(self.profile, config.enable_trust_profile_validation);

        info!(
            max_depth = config.max_nesting_depth,
            trust_profile = config.enable_trust_profile_validation,
            "verification service ready"
        );

        Ok(VerificationService {
            config,
            extraction,
            orchestrator,
            trust,
        })
    }
}
