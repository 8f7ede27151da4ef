//! Shared trust snapshot with build-then-swap refresh.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::DateTime;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::error;
use tracing::info;

use super::builder::TrustBuilder;
use super::builder::TrustVerifier;
use crate::Result;

/// An immutable generation of trust material.
#[derive(Debug, Clone)]
pub struct TrustSnapshot {
    /// Trust anchors and revocation settings.
    pub verifier: TrustVerifier,
    /// When this snapshot was built.
    pub last_refresh: DateTime<Utc>,
    /// Monotonic generation number, starting at 1.
    pub generation: u64,
}

/// Owner of the current [`TrustSnapshot`].
///
/// Readers call [`TrustStore::snapshot`] once per request and keep the
/// returned `Arc` for the request's duration, so a refresh that lands
/// mid-request is never observed half-way. Refreshes are serialized; each
/// builds a complete verifier before publishing it.
pub struct TrustStore {
    current: ArcSwap<TrustSnapshot>,
    builder: Box<dyn TrustBuilder>,
    writer: Mutex<()>,
}

impl std::fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustStore")
            .field("generation", &self.current.load().generation)
            .finish_non_exhaustive()
    }
}

impl TrustStore {
    /// Builds the first snapshot and returns a ready store.
    ///
    /// # Errors
    ///
    /// Returns the builder's error if the initial trust material cannot be
    /// loaded.
    pub fn initialize(builder: Box<dyn TrustBuilder>) -> Result<Self> {
        let verifier = builder.build()?;
        info!("trust store initialized");
        Ok(Self {
            current: ArcSwap::from_pointee(TrustSnapshot {
                verifier,
                last_refresh: Utc::now(),
                generation: 1,
            }),
            builder,
            writer: Mutex::new(()),
        })
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TrustSnapshot> {
        self.current.load_full()
    }

    /// Rebuilds trust material and publishes it.
    ///
    /// On failure the previous snapshot stays in place.
    ///
    /// # Errors
    ///
    /// Returns the builder's error.
    pub fn refresh(&self) -> Result<u64> {
        let _writer = self.writer.lock();
        let current = self.current.load().generation;

        let verifier = self.builder.build().inspect_err(|err| {
            error!(generation = current, error = %err, "trust refresh failed, keeping previous snapshot");
        })?;

        let generation = current + 1;
        self.current.store(Arc::new(TrustSnapshot {
            verifier,
            last_refresh: Utc::now(),
            generation,
        }));
        info!(generation, "trust store refreshed");
        Ok(generation)
    }
}
