//! Single-flight guard for periodic sweeps.
//!
//! A lease is a named row with a holder and an expiry. Acquisition is a
//! compare-and-set that succeeds only when the row is free or expired, so a
//! crashed holder blocks the sweep for at most one TTL.

use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{DomainError, DomainResult};
use crate::store::LeaseStore;

#[derive(Clone)]
pub struct SweepLease {
    leases: Arc<dyn LeaseStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    holder_id: Uuid,
}

impl SweepLease {
    /// Each instance gets its own holder id.
    pub fn new(leases: Arc<dyn LeaseStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            leases,
            clock,
            ttl,
            holder_id: Uuid::new_v4(),
        }
    }

    pub fn holder_id(&self) -> Uuid {
        self.holder_id
    }

    /// Takes the named lease or fails with `SweepInProgress`.
    pub async fn acquire(&self, name: &'static str) -> DomainResult<LeaseGuard> {
        let acquired = self
            .leases
            .try_acquire(name, self.holder_id, self.clock.now(), self.ttl)
            .await?;
        if !acquired {
            tracing::debug!(lease = name, "Lease held elsewhere");
            return Err(DomainError::SweepInProgress(name));
        }
        Ok(LeaseGuard {
            leases: self.leases.clone(),
            name,
            holder_id: self.holder_id,
        })
    }
}

/// Held lease. Must be released explicitly; an unreleased lease expires.
#[must_use = "release the lease when the sweep is done"]
pub struct LeaseGuard {
    leases: Arc<dyn LeaseStore>,
    name: &'static str,
    holder_id: Uuid,
}

impl LeaseGuard {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn release(self) {
        if let Err(e) = self.leases.release(self.name, self.holder_id).await {
            tracing::warn!(lease = self.name, error = %e, "Failed to release lease");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::InMemoryStore;
    use chrono::Utc;

    #[tokio::test]
    async fn test_second_holder_is_refused_until_release() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let a = SweepLease::new(store.clone(), clock.clone(), Duration::minutes(5));
        let b = SweepLease::new(store.clone(), clock.clone(), Duration::minutes(5));

        let guard = a.acquire("lifecycle").await.unwrap();
        assert!(matches!(
            b.acquire("lifecycle").await,
            Err(DomainError::SweepInProgress("lifecycle"))
        ));
        assert!(b.acquire("reminders").await.is_ok());

        guard.release().await;
        assert!(b.acquire("lifecycle").await.is_ok());
    }

    #[tokio::test]
    async fn test_abandoned_lease_expires() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let a = SweepLease::new(store.clone(), clock.clone(), Duration::minutes(5));
        let b = SweepLease::new(store.clone(), clock.clone(), Duration::minutes(5));

        let _abandoned = a.acquire("lifecycle").await.unwrap();
        clock.advance(Duration::minutes(6));
        assert!(b.acquire("lifecycle").await.is_ok());
    }
}
