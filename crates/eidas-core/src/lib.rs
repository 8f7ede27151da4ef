//! Signature-structure discovery and compliance reporting for eIDAS signed
//! documents.
//!
//! `eidas-core` takes one uploaded document, recursively uncovers everything
//! it contains (ZIP/ASiC entries, attachments embedded in XML forms,
//! content enveloped in CMS signatures), works out which files sign which
//! others, and asks an external signature engine to validate each signed
//! item. The result is one [`ReportEntry`] per discovered file.
//!
//! Cryptographic validation is not done here: the engine, the optional
//! trusted-profile service and the content classifier are plugged in through
//! the [`SignatureEngine`], [`TrustProfileService`] and
//! [`FormatClassifier`](formats::FormatClassifier) traits.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use eidas_core::ServiceConfig;
//! use eidas_core::VerificationService;
//! # use eidas_core::SignatureEngine;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let engine: Arc<dyn SignatureEngine> = unimplemented!();
//! let service = VerificationService::builder()
//!     .config(ServiceConfig::default())
//!     .engine(engine)
//!     .build()?;
//!
//! let upload = std::fs::read("application.xml")?;
//! for entry in service.validate(&upload, "application.xml", None)? {
//!     println!("{}: {} signature(s)", entry.file_name, entry.signature_count());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod profile;
pub mod report;
pub mod service;
pub mod signature;
pub mod trust;
pub mod types;
pub mod validation;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export main API types
pub use config::ReportOptions;
pub use config::ServiceConfig;
pub use config::TrustConfig;
pub use error::Result;
pub use error::VerifyError;
pub use profile::TrustProfileService;
pub use report::CertificateEntry;
pub use report::ReportEntry;
pub use service::VerificationService;
pub use service::VerificationServiceBuilder;
pub use signature::Indication;
pub use signature::SignatureEngine;
pub use types::SignedItem;
pub use workspace::Workspace;
