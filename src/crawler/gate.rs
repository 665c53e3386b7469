//! Counting admission gate for page fetches
//!
//! The gate admits at most N operations at once. Callers beyond the cap wait in FIFO
//! order; releasing a slot hands it directly to the longest-waiting caller. The gate is
//! backed by `tokio::sync::Semaphore`, whose waiters queue fairly and whose release
//! wakes exactly one waiter.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Returned by `acquire` once the gate has been closed for shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("concurrency gate is closed")]
pub struct GateClosed;

/// An admitted slot; the slot is released when the permit is dropped
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    /// Releases the slot explicitly
    pub fn release(self) {
        drop(self);
    }
}

/// Global cap on simultaneous page fetches
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Default number of simultaneous fetches
    pub const DEFAULT_CAPACITY: usize = 3;

    /// Creates a gate admitting `capacity` operations (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits until a slot is free, then admits the caller
    ///
    /// Fails immediately, for queued and future callers alike, once the gate is closed.
    pub async fn acquire(&self) -> Result<GatePermit, GateClosed> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| GateClosed)?;

        tracing::trace!("Gate admitted fetch ({} in flight)", self.in_flight());
        Ok(GatePermit { _permit: permit })
    }

    /// Number of operations currently admitted
    pub fn in_flight(&self) -> usize {
        self.capacity
            .saturating_sub(self.semaphore.available_permits())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Closes the gate: every waiting and future `acquire` fails with `GateClosed`
    ///
    /// Operations already admitted keep their slots until they finish.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
