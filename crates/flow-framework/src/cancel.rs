//! # Cancellation Token
//!
//! A write-once, broadcast stop signal. Cancelling is idempotent, reading never
//! blocks, and any number of tasks can wait on it at once. It wraps
//! [`tokio_util::sync::CancellationToken`] and adds a single log line on the
//! first cancel so shutdowns are visible in traces.
//!
//! The actor uses one as its stop signal; the pipeline shares one across all
//! of its stages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: CancellationToken,
    label: Arc<str>,
    first: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self {
            inner: CancellationToken::new(),
            label: label.into(),
            first: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signals every holder. Calls after the first have no effect; returns
    /// `true` only for the call that cancelled.
    pub fn cancel(&self) -> bool {
        let first = !self.first.swap(true, Ordering::AcqRel);
        if first {
            debug!(token = %self.label, "Cancellation requested");
        }
        self.inner.cancel();
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called. Cancel-safe, so
    /// it can sit in any `tokio::select!` arm.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.cancelled()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_cancel_is_idempotent_and_broadcast() {
        let token = CancelToken::new("test");
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let token = token.clone();
                tokio::spawn(async move { token.cancelled().await })
            })
            .collect();

        assert!(!token.is_cancelled());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter not woken")
                .unwrap();
        }
        assert!(logs_contain("Cancellation requested"));
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("Cancellation requested"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("expected one cancel log line, got {n}")),
            }
        });
    }
}
