//! Trust material: loading, sharing and periodic refresh.

mod builder;
mod refresh;
mod store;

pub use builder::KeystoreTrustBuilder;
pub use builder::RevocationSources;
pub use builder::TrustBuilder;
pub use builder::TrustVerifier;
pub use builder::TrustedCertificateSource;
pub use refresh::RefreshTask;
pub use store::TrustSnapshot;
pub use store::TrustStore;
