//! Task bodies for sources, stage workers and merge forwarders.
//!
//! Every loop here ends when its input closes, when its output has no reader,
//! or when the pipeline is cancelled, whichever comes first.

use super::stream::{forward, Item, Pull, Stream};
use super::Shared;
use crate::barrier::Party;
use crate::config::FailurePolicy;
use crate::error::{BoxError, StageFailure};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

pub(crate) async fn run_source<T, I>(
    shared: Arc<Shared>,
    items: I,
    output: mpsc::Sender<Item<T>>,
) where
    I: Iterator<Item = T>,
{
    let mut emitted = 0u64;
    for item in items {
        if !forward(&output, &shared.token, Ok(item)).await {
            break;
        }
        emitted += 1;
    }
    debug!(stage = "source", emitted, "Source finished");
}

pub(crate) async fn run_stream_source<T, St>(
    shared: Arc<Shared>,
    stream: St,
    output: mpsc::Sender<Item<T>>,
) where
    St: futures::Stream<Item = T>,
{
    let mut stream = std::pin::pin!(stream);
    let mut emitted = 0u64;
    loop {
        let next = tokio::select! {
            biased;
            _ = shared.token.cancelled() => None,
            next = stream.next() => next,
        };
        let Some(item) = next else { break };
        if !forward(&output, &shared.token, Ok(item)).await {
            break;
        }
        emitted += 1;
    }
    debug!(stage = "source", emitted, "Source finished");
}

pub(crate) struct Worker<T, U, F> {
    pub(crate) stage: Arc<str>,
    pub(crate) index: usize,
    pub(crate) input: Stream<T>,
    pub(crate) party: Party<Item<U>>,
    pub(crate) transform: Arc<F>,
}

impl<T, U, F, Fut, E> Worker<T, U, F>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<U, E>>,
    E: Into<BoxError>,
{
    pub(crate) async fn run(self, shared: Arc<Shared>) {
        let Worker {
            stage,
            index,
            input,
            party,
            transform,
        } = self;
        let token = &shared.token;
        let mut processed = 0u64;
        let mut failed = 0u64;

        while let Pull::Item(item) = input.pull(token).await {
            let out = match item {
                Ok(value) => match (*transform)(value).await {
                    Ok(value) => Ok(value),
                    Err(e) => {
                        failed += 1;
                        let failure = StageFailure::new(&*stage, e);
                        match shared.config.failure_policy {
                            FailurePolicy::Forward => {
                                debug!(stage = %stage, worker = index, error = %failure.source, "Forwarding failed item");
                                Err(failure)
                            }
                            FailurePolicy::FailFast => {
                                shared.fail(failure);
                                break;
                            }
                        }
                    }
                },
                // Failures from earlier stages pass through untouched.
                Err(upstream) => Err(upstream),
            };
            processed += 1;
            if !forward(&party.output, token, out).await {
                break;
            }
        }

        drop(party);
        debug!(stage = %stage, worker = index, processed, failed, "Worker finished");
    }
}

pub(crate) async fn run_forwarder<T>(shared: Arc<Shared>, input: Stream<T>, party: Party<Item<T>>) {
    let mut forwarded = 0u64;
    while let Pull::Item(item) = input.pull(&shared.token).await {
        if !forward(&party.output, &shared.token, item).await {
            break;
        }
        forwarded += 1;
    }
    drop(party);
    debug!(stage = "merge", from = input.name(), forwarded, "Upstream finished");
}
