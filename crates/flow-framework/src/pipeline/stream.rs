//! Stage outputs and the sink-side drain.

use super::Shared;
use crate::cancel::CancelToken;
use crate::error::{PipelineError, StageFailure};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// What flows between stages: a value, or the tagged failure of an earlier
/// stage (forward policy only).
pub type Item<T> = Result<T, StageFailure>;

/// The output of a source, stage or merge.
///
/// Clones share one receiver. Stages built on clones of the same stream split
/// its items between them; nothing is seen twice.
pub struct Stream<T> {
    name: Arc<str>,
    receiver: Arc<Mutex<mpsc::Receiver<Item<T>>>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            receiver: self.receiver.clone(),
        }
    }
}

pub(crate) enum Pull<T> {
    Item(Item<T>),
    Closed,
    Cancelled,
}

impl<T> Stream<T> {
    pub(crate) fn new(name: Arc<str>, receiver: mpsc::Receiver<Item<T>>) -> Self {
        Self {
            name,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Name of the stage that produces this stream.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Takes the next item, racing cancellation. Whoever gets the lock first
    /// gets the item.
    pub(crate) async fn pull(&self, token: &CancelToken) -> Pull<T> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Pull::Cancelled,
            item = async { self.receiver.lock().await.recv().await } => match item {
                Some(item) => Pull::Item(item),
                None => Pull::Closed,
            },
        }
    }
}

/// Sends `item` unless cancellation wins first. `false` means stop: either
/// the pipeline was cancelled or nobody reads the output any more.
pub(crate) async fn forward<T>(
    output: &mpsc::Sender<Item<T>>,
    token: &CancelToken,
    item: Item<T>,
) -> bool {
    if token.is_cancelled() {
        return false;
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        sent = output.send(item) => sent.is_ok(),
    }
}

/// The sink end of a pipeline.
///
/// [`next`](Self::next) yields items until the final stream closes or the
/// pipeline is cancelled; both end the drain. Once ended it stays ended.
pub struct Drain<T> {
    stream: Stream<T>,
    shared: Arc<Shared>,
    cancelled: bool,
    ended: bool,
}

impl<T: Send + 'static> Drain<T> {
    pub(crate) fn new(stream: Stream<T>, shared: Arc<Shared>) -> Self {
        Self {
            stream,
            shared,
            cancelled: false,
            ended: false,
        }
    }

    /// Waits for the next item. `None` is end-of-stream, including after
    /// cancellation.
    pub async fn next(&mut self) -> Option<Item<T>> {
        if self.ended {
            return None;
        }
        match self.stream.pull(&self.shared.token).await {
            Pull::Item(item) => Some(item),
            Pull::Closed => {
                self.ended = true;
                None
            }
            Pull::Cancelled => {
                self.ended = true;
                self.cancelled = true;
                None
            }
        }
    }

    /// True once the drain has ended because of cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Reads everything, keeping forwarded failures as `Err` items.
    ///
    /// A cancelled pipeline yields [`PipelineError::PipelineCancelled`], or
    /// the recorded failure if a fail-fast stage caused the cancel. The
    /// failure is handed to the first drain that asks for it.
    pub async fn collect(mut self) -> Result<Vec<Item<T>>, PipelineError> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item);
        }
        if self.cancelled {
            return Err(match self.shared.take_failure() {
                Some(failure) => PipelineError::StageTransformFailure(failure),
                None => PipelineError::PipelineCancelled,
            });
        }
        Ok(items)
    }

    /// Like [`collect`](Self::collect) but stops at the first failed item and
    /// returns it as the error.
    pub async fn collect_ok(mut self) -> Result<Vec<T>, PipelineError> {
        let mut values = Vec::new();
        while let Some(item) = self.next().await {
            values.push(item?);
        }
        if self.cancelled {
            return Err(match self.shared.take_failure() {
                Some(failure) => PipelineError::StageTransformFailure(failure),
                None => PipelineError::PipelineCancelled,
            });
        }
        Ok(values)
    }

    /// Adapts the drain to a [`futures::Stream`].
    pub fn into_stream(self) -> impl futures::Stream<Item = Item<T>> + Send {
        futures::stream::unfold(self, |mut drain| async move {
            let item = drain.next().await?;
            Some((item, drain))
        })
    }
}
