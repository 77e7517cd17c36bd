//! Per-artwork update lock
//!
//! Short-lived mutual exclusion over the fast store's atomic
//! set-if-absent-with-TTL. The TTL bounds the stall a crashed holder can
//! cause; the token check on release keeps an expired holder from deleting a
//! successor's lock. The token check and delete are two commands, so an
//! expiry in between can still drop a successor's lock; the TTL makes that
//! window milliseconds wide and the recompute-from-counts design makes the
//! worst case a redundant recompute, not corruption.

use crate::cache::{keys, FastStore};
use artrank_common::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Held lock for one artwork. Must be released via [`ArtworkLock::release`];
/// the TTL reclaims it if the holder dies first.
pub struct ArtworkLock {
    store: Arc<dyn FastStore>,
    key: String,
    token: String,
}

impl std::fmt::Debug for ArtworkLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtworkLock")
            .field("key", &self.key)
            .field("token", &self.token)
            .finish()
    }
}

impl ArtworkLock {
    /// Try to acquire the lock once. Contention is a typed, retryable error;
    /// nothing has been mutated when it is returned.
    pub async fn acquire(
        store: Arc<dyn FastStore>,
        artwork_id: &str,
        ttl: Duration,
    ) -> Result<Self> {
        let key = keys::artwork_lock(artwork_id);
        let token = Uuid::new_v4().to_string();

        if store.set_nx_ttl(&key, &token, ttl).await? {
            debug!("Acquired lock {} ({})", key, token);
            Ok(Self { store, key, token })
        } else {
            Err(Error::LockContention(artwork_id.to_string()))
        }
    }

    /// Release the lock. Never fails: a release error leaves the key to its
    /// TTL, which is the documented recovery path.
    pub async fn release(self) {
        match self.store.get(&self.key).await {
            Ok(Some(token)) if token == self.token => {
                if let Err(e) = self.store.del(&self.key).await {
                    warn!("Failed to release lock {}: {}", self.key, e);
                }
            }
            Ok(_) => {
                // Expired or taken over; deleting now would hit the next holder
                warn!("Lock {} no longer held at release time", self.key);
            }
            Err(e) => {
                warn!("Failed to read lock {} at release: {}", self.key, e);
            }
        }
    }
}
