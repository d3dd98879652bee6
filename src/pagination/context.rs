//! Per-request deadline and cancellation

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied bounds on how long store calls may run
///
/// Every store call made for a request goes through [`RequestContext::guard`],
/// so one deadline covers the whole request, count query included.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context with no deadline and a fresh cancellation token
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose deadline is `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().with_deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this request when triggered
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run a store call, giving up with [`Error::Cancelled`] when the token
    /// fires or the deadline passes
    pub async fn guard<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(Error::cancelled(format!("{operation} was cancelled by the caller")));
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::cancelled(format!(
                        "{operation} exceeded the request deadline"
                    ))),
                },
                None => call.await,
            }
        };

        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                Err(Error::cancelled(format!("{operation} was cancelled by the caller")))
            }
            result = bounded => result,
        };

        if let Err(e) = &result {
            if e.is_cancelled() {
                tracing::warn!(operation, "{e}");
            }
        }

        result
    }
}
