//! Shared concurrency tokens.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Semaphore, SemaphorePermit};

/// Fixed-size pool of tokens bounding how many directory expansions run at once.
///
/// Acquisition never blocks: callers that get `None` are expected to do the
/// work inline instead. Only the semaphore's non-waiting path is used, so no
/// async runtime is involved.
#[derive(Debug)]
pub struct TokenPool {
    capacity: usize,
    semaphore: Semaphore,
    peak: AtomicUsize,
}

impl TokenPool {
    /// Create a pool holding `capacity` tokens, capped at
    /// [`Semaphore::MAX_PERMITS`].
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        Self {
            capacity,
            semaphore: Semaphore::new(capacity),
            peak: AtomicUsize::new(0),
        }
    }

    /// Take a token if one is free.
    ///
    /// The token goes back to the pool when the returned guard is dropped.
    pub fn try_acquire(&self) -> Option<Token<'_>> {
        let permit = self.semaphore.try_acquire().ok()?;
        self.peak.fetch_max(self.in_use(), Ordering::Relaxed);
        Some(Token { _permit: permit })
    }

    /// Total number of tokens.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Tokens currently held.
    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }

    /// Highest number of tokens held at once so far.
    pub fn peak_in_use(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }
}

/// A held token. Released on drop.
#[derive(Debug)]
pub struct Token<'a> {
    _permit: SemaphorePermit<'a>,
}
