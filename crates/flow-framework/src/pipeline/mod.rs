//! # Cancellable Fan-out/Fan-in Pipeline
//!
//! A [`Pipeline`] wires a source through transform stages into a [`Drain`].
//! Every stage and merge is backed by Tokio tasks tracked by the pipeline, all
//! sharing one [`CancelToken`].
//!
//! ```text
//! source ──► stage "square" (N workers, one shared input) ──► drain
//!
//! source ─┬─► stage a ─┐
//!         └─► stage b ─┴─► merge ──► drain
//! ```
//!
//! - **Fan-out**: a stage's workers pull from one shared receiver; the first
//!   idle worker takes the next item. Order is kept only with one worker.
//! - **Fan-in**: [`Pipeline::merge`] forwards N streams into one, closing the
//!   output after the last upstream closes.
//! - **Cancellation**: [`Pipeline::cancel`] is seen at every send and receive.
//!   A transform already running finishes, but its output is discarded.
//! - **Failures**: fixed per pipeline by [`FailurePolicy`].
//!
//! ```rust
//! use flow_framework::{Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = Pipeline::new("squares", PipelineConfig::default());
//!     let numbers = pipeline.source(vec![2, 3]);
//!     let squares = pipeline.stage("square", numbers, 1, |n: i32| n * n);
//!     let out = pipeline.drain(squares).collect_ok().await.unwrap();
//!     assert_eq!(out, vec![4, 9]);
//! }
//! ```

mod stage;
mod stream;

pub use stream::{Drain, Item, Stream};

use crate::barrier;
use crate::cancel::CancelToken;
use crate::config::{clamp_capacity, FailurePolicy, PipelineConfig};
use crate::error::{BoxError, StageFailure};
use stage::Worker;
use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

pub(crate) struct Shared {
    name: Arc<str>,
    token: CancelToken,
    tracker: TaskTracker,
    config: PipelineConfig,
    first_failure: Mutex<Option<StageFailure>>,
}

impl Shared {
    /// Fail-fast: keep the first failure and cancel everything. A failure
    /// that arrives after the pipeline was cancelled is dropped.
    fn fail(&self, failure: StageFailure) {
        let mut first = self
            .first_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.token.is_cancelled() {
            debug!(pipeline = %self.name, error = %failure, "Transform failed after cancel, dropped");
            return;
        }
        warn!(pipeline = %self.name, error = %failure, "Transform failed, cancelling pipeline");
        *first = Some(failure);
        self.token.cancel();
    }

    fn take_failure(&self) -> Option<StageFailure> {
        self.first_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Builder and owner of one pipeline's tasks.
///
/// Cloning is cheap and every clone controls the same pipeline.
#[derive(Clone)]
pub struct Pipeline {
    shared: Arc<Shared>,
}

impl Pipeline {
    pub fn new(name: impl Into<Arc<str>>, config: PipelineConfig) -> Self {
        let name = name.into();
        let config = PipelineConfig {
            channel_capacity: clamp_capacity("pipeline channel", config.channel_capacity),
            ..config
        };
        Self {
            shared: Arc::new(Shared {
                token: CancelToken::new(name.clone()),
                name,
                tracker: TaskTracker::new(),
                config,
                first_failure: Mutex::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.shared.config.failure_policy
    }

    /// Emits `items` in order, then closes.
    pub fn source<T, I>(&self, items: I) -> Stream<T>
    where
        T: Send + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let (output, receiver) = self.channel();
        let items = items.into_iter();
        self.shared
            .tracker
            .spawn(stage::run_source(self.shared.clone(), items, output));
        Stream::new("source".into(), receiver)
    }

    /// Emits whatever `stream` yields, then closes.
    pub fn source_stream<T, St>(&self, stream: St) -> Stream<T>
    where
        T: Send + 'static,
        St: futures::Stream<Item = T> + Send + 'static,
    {
        let (output, receiver) = self.channel();
        self.shared
            .tracker
            .spawn(stage::run_stream_source(self.shared.clone(), stream, output));
        Stream::new("source".into(), receiver)
    }

    /// Adds an infallible stage with `workers` parallel workers.
    pub fn stage<T, U, F>(&self, name: &str, input: Stream<T>, workers: usize, transform: F) -> Stream<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.try_stage(name, input, workers, move |value| {
            Ok::<U, Infallible>(transform(value))
        })
    }

    /// Adds a fallible stage. Failures follow the pipeline's [`FailurePolicy`].
    pub fn try_stage<T, U, E, F>(
        &self,
        name: &str,
        input: Stream<T>,
        workers: usize,
        transform: F,
    ) -> Stream<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        E: Into<BoxError> + Send + 'static,
        F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
    {
        self.try_stage_async(name, input, workers, move |value| {
            std::future::ready(transform(value))
        })
    }

    /// Adds a fallible stage whose transform is async, e.g. file I/O.
    pub fn try_stage_async<T, U, E, F, Fut>(
        &self,
        name: &str,
        input: Stream<T>,
        workers: usize,
        transform: F,
    ) -> Stream<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        E: Into<BoxError> + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
    {
        let workers = if workers == 0 {
            warn!(stage = name, "0 workers requested, using 1");
            1
        } else {
            workers
        };
        let stage: Arc<str> = name.into();
        let (output, receiver) = self.channel();
        let transform = Arc::new(transform);
        debug!(stage = %stage, workers, from = input.name(), "Stage started");

        for (index, party) in barrier::split(stage.clone(), workers, output)
            .into_iter()
            .enumerate()
        {
            let worker = Worker {
                stage: stage.clone(),
                index,
                input: input.clone(),
                party,
                transform: transform.clone(),
            };
            self.shared.tracker.spawn(worker.run(self.shared.clone()));
        }
        Stream::new(stage, receiver)
    }

    /// Fans `sources` into one stream. It closes once every source has closed.
    pub fn merge<T>(&self, sources: Vec<Stream<T>>) -> Stream<T>
    where
        T: Send + 'static,
    {
        let name: Arc<str> = "merge".into();
        let (output, receiver) = self.channel();
        let inputs = sources.len();
        debug!(stage = %name, inputs, "Merge started");
        // With no sources nobody holds the barrier, the output sender is
        // dropped inside `split` and the merge is closed from the start.
        for (source, party) in sources
            .into_iter()
            .zip(barrier::split(name.clone(), inputs, output))
        {
            self.shared
                .tracker
                .spawn(stage::run_forwarder(self.shared.clone(), source, party));
        }
        Stream::new(name, receiver)
    }

    /// The sink end for `stream`.
    pub fn drain<T: Send + 'static>(&self, stream: Stream<T>) -> Drain<T> {
        Drain::new(stream, self.shared.clone())
    }

    /// Tells every stage to stop. Idempotent.
    pub fn cancel(&self) {
        if self.shared.token.cancel() {
            info!(pipeline = %self.shared.name, "Pipeline cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    /// The pipeline's token, for producers that want to stop with it.
    pub fn token(&self) -> CancelToken {
        self.shared.token.clone()
    }

    /// Source, worker and forwarder tasks still running.
    pub fn active_tasks(&self) -> usize {
        self.shared.tracker.len()
    }

    /// Waits until every task of this pipeline has exited.
    pub async fn join(&self) {
        self.shared.tracker.close();
        self.shared.tracker.wait().await;
        debug!(pipeline = %self.shared.name, "All pipeline tasks finished");
    }

    fn channel<T>(&self) -> (mpsc::Sender<Item<T>>, mpsc::Receiver<Item<T>>) {
        mpsc::channel(self.shared.config.channel_capacity)
    }
}
