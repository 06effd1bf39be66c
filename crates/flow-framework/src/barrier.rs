//! # Close Barrier
//!
//! Counting barrier that closes a shared output channel exactly once.
//!
//! A stage with N workers (or a merge with N upstreams) gives each of its N
//! tasks a [`Party`]: a sender clone plus an arrival on the barrier. The
//! barrier itself keeps the original sender. A party's sender is dropped
//! before its arrival is counted, so when the N-th arrival drops the original
//! no sender is left and the receiver sees end-of-stream. The atomic
//! countdown serializes concurrent arrivals; whichever task finishes last
//! performs the close.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

struct CloseBarrier<T> {
    name: Arc<str>,
    remaining: AtomicUsize,
    output: Mutex<Option<mpsc::Sender<T>>>,
}

impl<T> CloseBarrier<T> {
    fn arrive(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.output
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            debug!(stage = %self.name, "Output closed");
        }
    }
}

/// Splits `output` between `parties` tasks behind one close barrier.
pub(crate) fn split<T>(name: Arc<str>, parties: usize, output: mpsc::Sender<T>) -> Vec<Party<T>> {
    let senders: Vec<_> = (0..parties).map(|_| output.clone()).collect();
    let barrier = Arc::new(CloseBarrier {
        name,
        remaining: AtomicUsize::new(parties),
        output: Mutex::new(Some(output)),
    });
    senders
        .into_iter()
        .map(|output| Party {
            output,
            _arrival: Arrival {
                barrier: barrier.clone(),
            },
        })
        .collect()
}

/// One task's share of the output.
///
/// Fields drop in declaration order, so the sender is always gone before the
/// arrival is counted, including when the task returns early or panics.
pub(crate) struct Party<T> {
    pub(crate) output: mpsc::Sender<T>,
    _arrival: Arrival<T>,
}

struct Arrival<T> {
    barrier: Arc<CloseBarrier<T>>,
}

impl<T> Drop for Arrival<T> {
    fn drop(&mut self) {
        self.barrier.arrive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closes_after_last_party_only() {
        let (tx, mut rx) = mpsc::channel::<u32>(4);
        let mut parties = split("merge".into(), 3, tx);

        let first = parties.pop().unwrap();
        first.output.send(1).await.unwrap();
        drop(first);
        drop(parties.pop());

        assert_eq!(rx.recv().await, Some(1));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        ));

        drop(parties.pop());
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_arrivals_close_exactly_once() {
        let (tx, mut rx) = mpsc::channel::<usize>(64);
        let parties = split("stage".into(), 16, tx);

        let handles: Vec<_> = parties
            .into_iter()
            .enumerate()
            .map(|(i, party)| {
                tokio::spawn(async move {
                    party.output.send(i).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let mut seen = Vec::new();
        while let Some(i) = rx.recv().await {
            seen.push(i);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<_>>());
    }
}
