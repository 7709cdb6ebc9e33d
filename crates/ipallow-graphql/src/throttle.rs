//! Concurrency throttle bounding in-flight requests.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::error::{CancelStage, GraphqlClientError};

/// Counting admission gate for "max in-flight requests" constraints.
///
/// Capacity is fixed at construction. Clones share the same permits.
#[derive(Debug, Clone)]
pub struct Throttle {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Admission held for the duration of one exchange; released on drop.
#[derive(Debug)]
pub struct ThrottlePermit {
    _permit: OwnedSemaphorePermit,
}

impl Throttle {
    /// Create a throttle admitting at most `capacity` concurrent requests.
    ///
    /// # Errors
    /// Returns an error if `capacity == 0`.
    pub fn new(capacity: usize) -> Result<Self, GraphqlClientError> {
        if capacity == 0 {
            return Err(GraphqlClientError::Config(
                "throttle capacity must be > 0".into(),
            ));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently held.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.capacity
            .saturating_sub(self.semaphore.available_permits())
    }

    /// Take a permit without waiting.
    #[must_use]
    pub fn try_acquire(&self) -> Option<ThrottlePermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| ThrottlePermit { _permit: permit })
    }

    /// Wait for a permit, giving up if `cancel` fires first.
    pub async fn acquire(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ThrottlePermit, GraphqlClientError> {
        if cancel.is_cancelled() {
            return Err(GraphqlClientError::Cancelled(CancelStage::ThrottleWait));
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                Err(GraphqlClientError::Cancelled(CancelStage::ThrottleWait))
            }
            permit = Arc::clone(&self.semaphore).acquire_owned() => {
                permit
                    .map(|permit| ThrottlePermit { _permit: permit })
                    .map_err(|_| GraphqlClientError::Protocol {
                        message: "throttle closed".to_string(),
                    })
            }
        }
    }
}
