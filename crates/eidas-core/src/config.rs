//! Service configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::Result;
use crate::VerifyError;

/// Top-level configuration of the verification service.
///
/// All fields have defaults, so a configuration file only needs to name the
/// values it overrides.
///
/// # Examples
///
/// ```
/// use eidas_core::ServiceConfig;
///
/// let config = ServiceConfig::default()
///     .with_max_nesting_depth(5)
///     .with_trust_profile_validation(true);
/// assert_eq!(config.max_nesting_depth, 5);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory under which per-request workspaces are created.
    pub temp_dir: PathBuf,

    /// Maximum nesting depth of recursive attachment extraction.
    pub max_nesting_depth: usize,

    /// Validation policy used when the caller does not upload one.
    pub default_policy: PathBuf,

    /// Whether XML documents are also sent to the trust-profile service.
    pub enable_trust_profile_validation: bool,

    /// Raw engine report inclusion.
    pub report: ReportOptions,

    /// Keep per-request workspaces on disk for debugging.
    pub keep_workspace: bool,

    /// Trust material and refresh schedule.
    pub trust: TrustConfig,
}

impl Default for ServiceConfig {
    /// Creates a `ServiceConfig` with default settings.
    ///
    /// Default values:
    /// - `temp_dir`: `<system temp>/eidas`
    /// - `max_nesting_depth`: 3
    /// - `default_policy`: `constraint.xml`
    /// - `enable_trust_profile_validation`: false
    /// - `report`: no raw engine reports
    /// - `keep_workspace`: false
    /// - `trust`: see [`TrustConfig::default`]
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().join("eidas"),
            max_nesting_depth: 3,
            default_policy: PathBuf::from("constraint.xml"),
            enable_trust_profile_validation: false,
            report: ReportOptions::default(),
            keep_workspace: false,
            trust: TrustConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Sets the workspace root directory.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Sets the maximum attachment nesting depth.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Sets the default validation policy path.
    #[must_use]
    pub fn with_default_policy(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_policy = path.into();
        self
    }

    /// Enables or disables trust-profile confirmation for XML documents.
    #[must_use]
    pub fn with_trust_profile_validation(mut self, enabled: bool) -> Self {
        self.enable_trust_profile_validation = enabled;
        self
    }

    /// Sets raw engine report inclusion.
    #[must_use]
    pub fn with_report_options(mut self, report: ReportOptions) -> Self {
        self.report = report;
        self
    }

    /// Keeps request workspaces on disk after the request completes.
    #[must_use]
    pub fn with_keep_workspace(mut self, keep: bool) -> Self {
        self.keep_workspace = keep;
        self
    }

    /// Sets the trust configuration.
    #[must_use]
    pub fn with_trust(mut self, trust: TrustConfig) -> Self {
        self.trust = trust;
        self
    }

    /// Checks the configuration for values the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::Config` if the refresh interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.trust.refresh_interval_secs == 0 {
            return Err(VerifyError::Config(
                "trust.refresh_interval_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Flags controlling inclusion of the engine's raw reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Append the engine's detailed report text to each certificate entry.
    pub include_detailed_report: bool,
    /// Append the engine's diagnostic report text to each certificate entry.
    pub include_diagnostic_report: bool,
}

/// A trusted certificate supplied inline in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrustedCertificate {
    /// Display name used in log messages.
    pub name: String,
    /// Base64-encoded DER content.
    pub content_base64: String,
}

/// Trust material and trust-list settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Keystore file whose content is base64-encoded PKCS#12.
    pub keystore_file: Option<PathBuf>,
    /// Keystore password.
    pub keystore_password: String,
    /// Additional trusted certificates.
    pub trusted_certificates: Vec<TrustedCertificate>,
    /// List-of-trusted-lists location.
    pub lotl_url: String,
    /// Territory code of the list of trusted lists.
    pub lotl_code: String,
    /// Certificate and revocation cache directory.
    pub cache_dir: PathBuf,
    /// Seconds between background trust-store refreshes.
    pub refresh_interval_secs: u64,
    /// Consult online CRL and OCSP sources.
    pub online_revocation: bool,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            keystore_file: None,
            keystore_password: String::new(),
            trusted_certificates: Vec::new(),
            lotl_url: "https://ec.europa.eu/tools/lotl/eu-lotl.xml".to_string(),
            lotl_code: "EU".to_string(),
            cache_dir: std::env::temp_dir().join("eidas-cache"),
            refresh_interval_secs: 24 * 60 * 60,
            online_revocation: true,
        }
    }
}

impl TrustConfig {
    /// Returns the refresh schedule as a `Duration`.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
