//! Cancellation context for gateway exchanges.
//!
//! A `Context` bounds an exchange by a deadline, an explicit cancel signal,
//! or both. The pending request future is dropped as soon as either fires.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::TransportError;

/// Deadline and cancellation scope for a query.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Handle that cancels every `Context` derived from it.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel the associated context. Calling it again has no effect.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Context {
    /// A context that never expires and cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().deadline(deadline)
    }

    /// A cancellable context and the handle that cancels it.
    pub fn with_cancel() -> (Self, CancelHandle) {
        Self::background().cancellable()
    }

    /// Set or tighten the deadline. An earlier existing deadline is kept.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Attach a new cancel signal, replacing any existing one.
    pub fn cancellable(mut self) -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        self.cancel = Some(receiver);
        (self, CancelHandle { sender })
    }

    /// The deadline, if any.
    pub fn get_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check whether the context has already been cancelled or expired.
    pub fn err(&self) -> Option<TransportError> {
        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Some(TransportError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(TransportError::DeadlineExceeded);
        }
        None
    }

    /// Run `fut` until it completes or the context is done.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Cancelled` or `DeadlineExceeded` if the
    /// context finishes first, otherwise the future's own result.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        let mut cancel = self.cancel.clone();
        let cancelled = async {
            match cancel.as_mut() {
                // A dropped handle can no longer cancel; wait forever
                Some(rx) => {
                    let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
                    if !fired {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = fut => result,
            _ = cancelled => Err(TransportError::Cancelled),
            _ = expired => Err(TransportError::DeadlineExceeded),
        }
    }
}
