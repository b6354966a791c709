//! Admission gate bounding how many fetches run at once.
//!
//! A [`ConcurrencyLimiter`] hands out [`Slot`]s. A slot is released when it is
//! dropped, so a fetch that returns early, fails, or panics still frees its
//! place for the next waiter.
//!
//! ```rust
//! use imgfetch::downloader::ConcurrencyLimiter;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let limiter = ConcurrencyLimiter::new(2).unwrap();
//! let first = limiter.acquire().await.unwrap();
//! let _second = limiter.acquire().await.unwrap();
//! assert!(limiter.try_acquire().is_none());
//!
//! drop(first);
//! assert!(limiter.try_acquire().is_some());
//! assert_eq!(limiter.peak(), 2);
//! # }
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Counting gate admitting at most `capacity` holders at a time.
///
/// Clones share the same gate. The limiter also records the highest number
/// of simultaneous holders it has seen.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    gauge: Arc<Gauge>,
}

#[derive(Default)]
struct Gauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyLimiter {
    /// Creates a limiter admitting `capacity` holders.
    ///
    /// Returns [`Error::InvalidConcurrency`] when `capacity` is zero or above
    /// [`Semaphore::MAX_PERMITS`].
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > Semaphore::MAX_PERMITS {
            return Err(Error::InvalidConcurrency(capacity));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            gauge: Arc::new(Gauge::default()),
        })
    }

    /// Waits until fewer than `capacity` slots are held, then takes one.
    ///
    /// Fails only if the limiter has been closed.
    pub async fn acquire(&self) -> std::result::Result<Slot, AcquireError> {
        let permit = self.semaphore.clone().acquire_owned().await?;
        Ok(self.admit(permit))
    }

    /// Takes a slot if one is free right now.
    pub fn try_acquire(&self) -> Option<Slot> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| self.admit(permit))
    }

    /// Stops admitting. Current and future waiters get an error; held slots
    /// stay valid until dropped.
    pub fn close(&self) {
        self.semaphore.close();
    }

    fn admit(&self, permit: OwnedSemaphorePermit) -> Slot {
        let now = self.gauge.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(now, Ordering::SeqCst);
        Slot {
            _permit: permit,
            gauge: Arc::clone(&self.gauge),
        }
    }

    /// Maximum number of simultaneous holders.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Slots currently held.
    pub fn active(&self) -> usize {
        self.gauge.active.load(Ordering::SeqCst)
    }

    /// Highest number of slots ever held at the same time.
    pub fn peak(&self) -> usize {
        self.gauge.peak.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ConcurrencyLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrencyLimiter")
            .field("capacity", &self.capacity)
            .field("active", &self.active())
            .field("peak", &self.peak())
            .finish()
    }
}

/// A held place in a [`ConcurrencyLimiter`]. Released on drop.
pub struct Slot {
    _permit: OwnedSemaphorePermit,
    gauge: Arc<Gauge>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        // The gauge must go down before the permit is returned, otherwise a
        // waiter admitted in between could push `active` above capacity.
        self.gauge.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot").finish_non_exhaustive()
    }
}
