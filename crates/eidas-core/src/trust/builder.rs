//! Loading trust material into a verifier.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::Result;
use crate::VerifyError;
use crate::config::TrustConfig;

/// A trusted certificate in DER form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedCertificateSource {
    /// Configured display name.
    pub name: String,
    /// DER-encoded certificate.
    pub der: Vec<u8>,
}

/// Revocation sources the engine may consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevocationSources {
    /// Online CRL download.
    pub online_crl: bool,
    /// Online OCSP requests.
    pub online_ocsp: bool,
}

/// Trust anchors and revocation settings handed to the engine.
///
/// A verifier is immutable once built; refreshing trust material builds a
/// new one.
#[derive(Clone)]
pub struct TrustVerifier {
    /// Decoded PKCS#12 keystore with the Official Journal signing certificates.
    pub keystore: Option<Vec<u8>>,
    /// Keystore password.
    pub keystore_password: String,
    /// Additional trusted certificates.
    pub trusted_certificates: Vec<TrustedCertificateSource>,
    /// Revocation sources.
    pub revocation: RevocationSources,
    /// List-of-trusted-lists location.
    pub lotl_url: String,
    /// Territory code of the list of trusted lists.
    pub lotl_code: String,
    /// Certificate and revocation cache directory.
    pub cache_dir: PathBuf,
}

impl fmt::Debug for TrustVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustVerifier")
            .field("keystore_len", &self.keystore.as_ref().map(Vec::len))
            .field("keystore_password", &"<redacted>")
            .field("trusted_certificates", &self.trusted_certificates.len())
            .field("revocation", &self.revocation)
            .field("lotl_url", &self.lotl_url)
            .field("lotl_code", &self.lotl_code)
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}

/// Produces trust verifiers; invoked at startup and on every refresh.
pub trait TrustBuilder: Send + Sync {
    /// Builds a fresh verifier.
    fn build(&self) -> Result<TrustVerifier>;
}

/// Builds verifiers from a [`TrustConfig`].
///
/// A missing or undecodable keystore fails the build. Individual trusted
/// certificates that cannot be decoded are logged and skipped, and a cache
/// directory that cannot be created only produces a warning.
#[derive(Debug, Clone)]
pub struct KeystoreTrustBuilder {
    config: TrustConfig,
}

impl KeystoreTrustBuilder {
    /// Creates a builder for the given configuration.
    #[must_use]
    pub fn new(config: TrustConfig) -> Self {
        Self { config }
    }

    fn load_keystore(&self) -> Result<Option<Vec<u8>>> {
        let Some(path) = &self.config.keystore_file else {
            debug!("no keystore configured");
            return Ok(None);
        };
        let encoded = fs::read_to_string(path).map_err(|err| {
            VerifyError::Trust(format!("cannot read keystore {}: {err}", path.display()))
        })?;
        let der = decode_base64(&encoded).map_err(|err| {
            VerifyError::Trust(format!("keystore {} is not base64: {err}", path.display()))
        })?;
        Ok(Some(der))
    }

    fn load_trusted_certificates(&self) -> Vec<TrustedCertificateSource> {
        self.config
            .trusted_certificates
            .iter()
            .filter_map(|cert| match decode_base64(&cert.content_base64) {
                Ok(der) => Some(TrustedCertificateSource {
                    name: cert.name.clone(),
                    der,
                }),
                Err(err) => {
                    warn!(certificate = %cert.name, error = %err, "skipping undecodable trusted certificate");
                    None
                }
            })
            .collect()
    }
}

impl TrustBuilder for KeystoreTrustBuilder {
    fn build(&self) -> Result<TrustVerifier> {
        if let Err(err) = fs::create_dir_all(&self.config.cache_dir) {
            warn!(
                dir = %self.config.cache_dir.display(),
                error = %err,
                "cannot create certificate cache directory"
            );
        }

        let keystore = self.load_keystore()?;
        let trusted_certificates = self.load_trusted_certificates();
        let online = self.config.online_revocation;

        info!(
            trusted_certificates = trusted_certificates.len(),
            keystore = keystore.is_some(),
            lotl = %self.config.lotl_url,
            "trust material loaded"
        );

        Ok(TrustVerifier {
            keystore,
            keystore_password: self.config.keystore_password.clone(),
            trusted_certificates,
            revocation: RevocationSources {
                online_crl: online,
                online_ocsp: online,
            },
            lotl_url: self.config.lotl_url.clone(),
            lotl_code: self.config.lotl_code.clone(),
            cache_dir: self.config.cache_dir.clone(),
        })
    }
}

fn decode_base64(text: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::TrustedCertificate;
    use tempfile::TempDir;

    fn config_in(temp: &TempDir) -> TrustConfig {
        TrustConfig {
            cache_dir: temp.path().join("cache"),
            ..TrustConfig::default()
        }
    }

    #[test]
    fn test_build_without_keystore() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let verifier = KeystoreTrustBuilder::new(config_in(&temp)).build().unwrap();

        assert!(verifier.keystore.is_none());
        assert!(verifier.trusted_certificates.is_empty());
        assert!(verifier.revocation.online_ocsp);
        assert!(temp.path().join("cache").is_dir());
    }

    #[test]
    fn test_build_decodes_keystore() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let keystore = temp.path().join("oj.p12.b64");
        fs::write(&keystore, "AAEC\nAwQF\n").unwrap();

        let config = TrustConfig {
            keystore_file: Some(keystore),
            keystore_password: "secret".into(),
            ..config_in(&temp)
        };
        let verifier = KeystoreTrustBuilder::new(config).build().unwrap();
        assert_eq!(verifier.keystore, Some(vec![0, 1, 2, 3, 4, 5]));
        assert!(!format!("{verifier:?}").contains("secret"));
    }

    #[test]
    fn test_missing_keystore_is_fatal() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let config = TrustConfig {
            keystore_file: Some(temp.path().join("absent.p12")),
            ..config_in(&temp)
        };
        let err = KeystoreTrustBuilder::new(config).build().unwrap_err();
        assert!(matches!(err, VerifyError::Trust(_)));
    }

    #[test]
    fn test_bad_certificate_is_skipped() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let config = TrustConfig {
            trusted_certificates: vec![
                TrustedCertificate {
                    name: "good".into(),
                    content_base64: "AAEC".into(),
                },
                TrustedCertificate {
                    name: "bad".into(),
                    content_base64: "***".into(),
                },
            ],
            online_revocation: false,
            ..config_in(&temp)
        };
        let verifier = KeystoreTrustBuilder::new(config).build().unwrap();

        assert_eq!(verifier.trusted_certificates.len(), 1);
        assert_eq!(verifier.trusted_certificates[0].name, "good");
        assert!(!verifier.revocation.online_crl);
    }
}
