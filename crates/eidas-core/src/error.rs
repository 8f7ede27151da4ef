//! Error types for signature-structure discovery and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `VerifyError`.
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Errors that can occur while verifying an upload.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The uploaded document was missing or empty.
    #[error("uploaded document is empty")]
    EmptyUpload,

    /// A document could not be parsed as XML.
    #[error("invalid XML: {0}")]
    InvalidXml(String),

    /// A ZIP container is corrupted or unreadable.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Embedded attachment content is not valid base64.
    #[error("invalid base64 content: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The per-request workspace could not be prepared.
    #[error("cannot prepare workspace at {path}: {source}")]
    Workspace {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The signature validation engine reported a failure.
    #[error("signature engine failure: {0}")]
    Engine(String),

    /// The trust-profile confirmation service reported a failure.
    #[error("trust-profile service failure: {0}")]
    TrustProfile(String),

    /// Trust material could not be loaded.
    #[error("trust store error: {0}")]
    Trust(String),

    /// Configuration is inconsistent or incomplete.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VerifyError {
    /// Returns `true` if this error is caused by the caller's input and aborts
    /// the whole request.
    ///
    /// # Examples
    ///
    /// ```
    /// use eidas_core::VerifyError;
    ///
    /// assert!(VerifyError::EmptyUpload.is_input_error());
    /// assert!(!VerifyError::Engine("timeout".into()).is_input_error());
    /// ```
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyUpload)
    }

    /// Returns `true` if this error degrades a single file's report entry
    /// instead of failing the request.
    ///
    /// Collaborator failures and malformed embedded content fall into this
    /// category; the orchestrator turns them into partial report fragments.
    ///
    /// # Examples
    ///
    /// ```
    /// use eidas_core::VerifyError;
    ///
    /// let err = VerifyError::TrustProfile("connection refused".into());
    /// assert!(err.is_degradable());
    ///
    /// assert!(!VerifyError::EmptyUpload.is_degradable());
    /// ```
    #[must_use]
    pub const fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::InvalidXml(_)
                | Self::InvalidArchive(_)
                | Self::InvalidBase64(_)
                | Self::Engine(_)
                | Self::TrustProfile(_)
        )
    }

    /// Returns a context string for this error, if available.
    ///
    /// # Examples
    ///
    /// ```
    /// use eidas_core::VerifyError;
    ///
    /// let err = VerifyError::Trust("keystore missing".to_string());
    /// assert_eq!(err.context(), Some("keystore missing"));
    ///
    /// assert_eq!(VerifyError::EmptyUpload.context(), None);
    /// ```
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidXml(msg)
            | Self::InvalidArchive(msg)
            | Self::Engine(msg)
            | Self::TrustProfile(msg)
            | Self::Trust(msg)
            | Self::Config(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for VerifyError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => Self::Io(io),
            other => Self::InvalidArchive(other.to_string()),
        }
    }
}

impl From<roxmltree::Error> for VerifyError {
    fn from(err: roxmltree::Error) -> Self {
        Self::InvalidXml(err.to_string())
    }
}
