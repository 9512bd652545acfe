//! Checksum deduplication.
//!
//! Identical uploads are processed once. Inside one process, uploads with
//! the same checksum serialize on a [`SingleFlight`] lock so the second one
//! finds the identity the first created. Across processes the store's
//! unique checksum constraint decides, and the loser falls back to
//! [`grant_existing`].

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use modelhub_database::ModelStore;
use modelhub_entity::model::{AccessGrant, ModelIdentity};

use super::error::IngestError;

/// Per-key async locks, removed from the map once nobody holds or awaits them.
#[derive(Debug, Default)]
pub struct SingleFlight {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SingleFlight {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive use of `key`.
    pub async fn acquire(&self, key: &str) -> FlightGuard<'_> {
        let lock = self.locks.entry(key.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;
        FlightGuard {
            flights: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive hold on one key of a [`SingleFlight`].
#[derive(Debug)]
pub struct FlightGuard<'a> {
    flights: &'a SingleFlight,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map's reference left: no holder, no waiter.
        self.flights
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Grants `user_id` access to an existing identity.
///
/// Fails with `AlreadyUploadedByUser` if the user already holds a grant,
/// including when a concurrent request inserted it first.
pub async fn grant_existing(
    store: &dyn ModelStore,
    identity: ModelIdentity,
    user_id: &str,
) -> Result<ModelIdentity, IngestError> {
    if store.has_grant(identity.id, user_id).await? {
        return Err(IngestError::AlreadyUploadedByUser {
            model_id: identity.id,
        });
    }
    if !store
        .grant_access(&AccessGrant::uploader(identity.id, user_id))
        .await?
    {
        return Err(IngestError::AlreadyUploadedByUser {
            model_id: identity.id,
        });
    }
    debug!(model_id = %identity.id, user_id, "Access granted to existing model");
    Ok(identity)
}
