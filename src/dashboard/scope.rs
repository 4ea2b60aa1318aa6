//! Lifetime of a dashboard's requests
//!
//! Every request a view issues runs through its [`ViewScope`]. Closing the
//! scope, or dropping it with the view, resolves pending requests to
//! [`CampusError::Cancelled`]; requests that outlive the scope's timeout
//! resolve to [`CampusError::Timeout`]. Either way the view never applies
//! the result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;
use crate::utils::errors::{CampusError, Result};

pub const DEFAULT_VIEW_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle that cancels a scope from elsewhere
#[derive(Debug, Clone)]
pub struct ScopeCanceller {
    closed: Arc<watch::Sender<bool>>,
}

impl ScopeCanceller {
    pub fn cancel(&self) {
        self.closed.send_replace(true);
    }
}

#[derive(Debug)]
pub struct ViewScope {
    closed: Arc<watch::Sender<bool>>,
    timeout: Duration,
}

impl ViewScope {
    pub fn new(timeout: Duration) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            closed: Arc::new(closed),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn canceller(&self) -> ScopeCanceller {
        ScopeCanceller { closed: self.closed.clone() }
    }

    /// Cancel everything in flight and refuse new requests
    pub fn close(&self) {
        if !self.is_closed() {
            debug!("Closing view scope");
        }
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Run a future under the scope's cancellation and timeout
    pub async fn guard<T, F>(&self, future: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(CampusError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = closed.wait_for(|closed| *closed) => Err(CampusError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, future) => {
                outcome.map_err(|_| CampusError::Timeout { seconds: self.timeout.as_secs() })
            }
        }
    }

    /// [`ViewScope::guard`] for fallible futures
    pub async fn run<T, F>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.guard(future).await?
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_TIMEOUT)
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.closed.send_replace(true);
    }
}
