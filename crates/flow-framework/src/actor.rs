//! # Generic Actor Server
//!
//! This module defines the [`Actor`], the component that owns a piece of
//! state and serializes every access to it. It is the "server" half of the
//! actor model: it holds the state and the receiving end of the mailbox and
//! processes one message at a time.

use crate::cancel::CancelToken;
use crate::client::ActorClient;
use crate::config::{clamp_capacity, ActorConfig};
use crate::error::ActorError;
use crate::message::Envelope;
use crate::state::ActorState;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The actor that owns `S`.
///
/// **Concurrency Model**:
/// All events, requests and closure actions arrive through one bounded
/// mailbox and are handled in arrival order by a single task. Nothing outside
/// that task ever holds a reference to the state, so it needs no `Mutex`.
///
/// # Usage Pattern
///
/// 1.  **Create**: [`Actor::new`] returns the actor and its [`ActorClient`].
/// 2.  **Run**: spawn [`Actor::run`] with the context, or call [`Actor::spawn`].
/// 3.  **Use**: clone the client freely; call [`ActorClient::stop`] when done.
///
/// ```rust
/// use flow_framework::{Actor, ActorConfig, ActorState};
/// use async_trait::async_trait;
///
/// #[derive(Default)]
/// struct Counter { value: i64 }
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("counter error")]
/// struct CounterError;
///
/// #[async_trait]
/// impl ActorState for Counter {
///     type Event = i64;
///     type Request = ();
///     type Reply = i64;
///     type Context = ();
///     type Error = CounterError;
///
///     async fn handle_event(&mut self, delta: i64, _: &()) -> Result<(), CounterError> {
///         self.value += delta;
///         Ok(())
///     }
///
///     async fn handle_request(&mut self, _: (), _: &()) -> Result<i64, CounterError> {
///         Ok(self.value)
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = Actor::new(Counter::default(), ActorConfig::named("counter"));
///     let handle = actor.spawn(());
///
///     client.send_event(2).await.unwrap();
///     client.send_event(3).await.unwrap();
///     assert_eq!(client.request(()).await.unwrap(), 5);
///
///     client.stop();
///     let counter = handle.await.unwrap();
///     assert_eq!(counter.value, 5);
/// }
/// ```
///
/// # Shutdown
///
/// The loop ends when [`ActorClient::stop`] is called or when every client
/// has been dropped. On stop the mailbox refuses new messages, the messages
/// already queued are still handled, then [`ActorState::on_stop`] runs and
/// `run` hands the state back.
pub struct Actor<S: ActorState> {
    name: Arc<str>,
    state: S,
    receiver: mpsc::Receiver<Envelope<S>>,
    stop: CancelToken,
}

#[derive(Debug, Default)]
struct LoopStats {
    events: u64,
    requests: u64,
    execs: u64,
    failures: u64,
}

impl<S: ActorState> Actor<S> {
    /// Creates an actor owning `state` and the client that talks to it.
    ///
    /// A mailbox capacity of 0 is raised to 1.
    pub fn new(state: S, config: ActorConfig) -> (Self, ActorClient<S>) {
        let capacity = clamp_capacity("mailbox", config.mailbox_capacity);
        let (sender, receiver) = mpsc::channel(capacity);
        let name: Arc<str> = config.name.into();
        let stop = CancelToken::new(name.clone());
        let actor = Self {
            name,
            state,
            receiver,
            stop: stop.clone(),
        };
        let client = ActorClient::new(sender, stop, config.request_timeout);
        (actor, client)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawns [`run`](Self::run) on the current Tokio runtime.
    pub fn spawn(self, context: S::Context) -> JoinHandle<S> {
        tokio::spawn(self.run(context))
    }

    /// Runs the message loop until stopped, then returns the owned state.
    ///
    /// # Context Injection
    /// `context` is passed by reference to every handler. It is supplied here
    /// rather than in [`new`](Self::new) so that dependencies created after
    /// the actor can still be wired in.
    pub async fn run(mut self, context: S::Context) -> S {
        let actor = self.name.clone();
        info!(actor = %actor, "Actor started");

        if let Err(e) = self.state.on_start(&context).await {
            warn!(actor = %actor, error = %e, "on_start failed, not running");
            self.stop.cancel();
            // Pending reply slots are dropped here, so callers see ActorStopped.
            self.receiver.close();
            while self.receiver.try_recv().is_ok() {}
            return self.state;
        }

        let mut stats = LoopStats::default();
        let mut draining = false;
        loop {
            let next = tokio::select! {
                biased;
                _ = self.stop.cancelled(), if !draining => {
                    debug!(actor = %actor, "Stop requested, draining mailbox");
                    self.receiver.close();
                    draining = true;
                    continue;
                }
                next = self.receiver.recv() => next,
            };
            let Some(envelope) = next else { break };
            self.dispatch(envelope, &context, &mut stats).await;
        }

        self.stop.cancel();
        self.state.on_stop(&context).await;
        info!(
            actor = %actor,
            events = stats.events,
            requests = stats.requests,
            execs = stats.execs,
            failures = stats.failures,
            "Shutdown"
        );
        self.state
    }

    async fn dispatch(&mut self, envelope: Envelope<S>, ctx: &S::Context, stats: &mut LoopStats) {
        let actor = &*self.name;
        match envelope {
            Envelope::Event(event) => {
                debug!(actor, ?event, "Event");
                stats.events += 1;
                let outcome = AssertUnwindSafe(self.state.handle_event(event, ctx))
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        stats.failures += 1;
                        warn!(actor, error = %e, "Event handler failed, event dropped");
                    }
                    Err(panic) => {
                        stats.failures += 1;
                        warn!(actor, panic = panic_message(&*panic), "Event handler panicked");
                    }
                }
            }
            Envelope::Request {
                payload,
                respond_to,
            } => {
                debug!(actor, ?payload, "Request");
                stats.requests += 1;
                let outcome = AssertUnwindSafe(self.state.handle_request(payload, ctx))
                    .catch_unwind()
                    .await;
                let result = match outcome {
                    Ok(Ok(reply)) => Ok(reply),
                    Ok(Err(e)) => {
                        stats.failures += 1;
                        warn!(actor, error = %e, "Request failed");
                        Err(ActorError::handler(e))
                    }
                    Err(panic) => {
                        stats.failures += 1;
                        let message = panic_message(&*panic);
                        warn!(actor, panic = message, "Request handler panicked");
                        Err(ActorError::handler(format!("handler panicked: {message}")))
                    }
                };
                if respond_to.send(result).is_err() {
                    debug!(actor, "Requester gone, reply dropped");
                }
            }
            Envelope::Exec(job) => {
                debug!(actor, "Exec");
                stats.execs += 1;
                let state = &mut self.state;
                if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| job(state))) {
                    stats.failures += 1;
                    warn!(actor, panic = panic_message(&*panic), "Exec closure panicked");
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tracing::Instrument;
    use tracing_test::traced_test;

    #[derive(Debug, Default)]
    struct Journal {
        entries: Vec<String>,
        started: bool,
        stopped: bool,
    }

    #[derive(Debug)]
    enum JournalRequest {
        Len,
        Fail,
        Panic,
        Sleep(Duration),
    }

    #[derive(Debug, thiserror::Error)]
    #[error("journal refused: {0}")]
    struct JournalError(String);

    #[async_trait]
    impl ActorState for Journal {
        type Event = String;
        type Request = JournalRequest;
        type Reply = usize;
        type Context = ();
        type Error = JournalError;

        async fn on_start(&mut self, _ctx: &()) -> Result<(), JournalError> {
            self.started = true;
            Ok(())
        }

        async fn handle_event(&mut self, event: String, _ctx: &()) -> Result<(), JournalError> {
            if event.is_empty() {
                return Err(JournalError("empty entry".into()));
            }
            self.entries.push(event);
            Ok(())
        }

        async fn handle_request(
            &mut self,
            request: JournalRequest,
            _ctx: &(),
        ) -> Result<usize, JournalError> {
            match request {
                JournalRequest::Len => Ok(self.entries.len()),
                JournalRequest::Fail => Err(JournalError("asked to fail".into())),
                JournalRequest::Panic => panic!("boom"),
                JournalRequest::Sleep(d) => {
                    tokio::time::sleep(d).await;
                    Ok(self.entries.len())
                }
            }
        }

        async fn on_stop(&mut self, _ctx: &()) {
            self.stopped = true;
        }
    }

    #[tokio::test]
    async fn test_events_apply_in_send_order() {
        let (actor, client) = Actor::new(Journal::default(), ActorConfig::named("journal"));
        let handle = actor.spawn(());

        for i in 0..100 {
            client.send_event(format!("e{i}")).await.unwrap();
        }
        assert_eq!(client.request(JournalRequest::Len).await.unwrap(), 100);

        client.stop();
        let journal = handle.await.unwrap();
        let expected: Vec<String> = (0..100).map(|i| format!("e{i}")).collect();
        assert_eq!(journal.entries, expected);
        assert!(journal.started);
        assert!(journal.stopped);
    }

    #[tokio::test]
    async fn test_failing_handlers_keep_the_loop_alive() {
        let (actor, client) = Actor::new(Journal::default(), ActorConfig::named("journal"));
        let handle = actor.spawn(());

        client.send_event(String::new()).await.unwrap();
        let err = client.request(JournalRequest::Fail).await.unwrap_err();
        assert!(matches!(err, ActorError::HandlerFailure(_)));
        assert!(err.to_string().contains("asked to fail"));

        let err = client.request(JournalRequest::Panic).await.unwrap_err();
        assert!(err.to_string().contains("boom"));

        client.send_event("kept".into()).await.unwrap();
        assert_eq!(client.request(JournalRequest::Len).await.unwrap(), 1);

        client.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_drains_queued_messages() {
        let (actor, client) = Actor::new(
            Journal::default(),
            ActorConfig::named("journal").with_mailbox_capacity(64),
        );

        // Queue before the loop runs, then stop.
        for i in 0..10 {
            client.send_event(format!("e{i}")).await.unwrap();
        }
        client.stop();
        client.stop();

        let journal = actor.run(()).await;
        assert_eq!(journal.entries.len(), 10);
        assert!(matches!(
            client.send_event("late".into()).await,
            Err(ActorError::MailboxClosed)
        ));
        assert!(matches!(
            client.request(JournalRequest::Len).await,
            Err(ActorError::ActorStopped)
        ));
    }

    #[tokio::test]
    async fn test_loop_ends_when_clients_dropped() {
        let (actor, client) = Actor::new(Journal::default(), ActorConfig::named("journal"));
        let handle = actor.spawn(());
        client.send_event("only".into()).await.unwrap();
        drop(client);

        let journal = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("actor did not stop")
            .unwrap();
        assert_eq!(journal.entries, vec!["only".to_string()]);
    }

    #[tokio::test]
    async fn test_late_reply_after_timeout_is_harmless() {
        let (actor, client) = Actor::new(Journal::default(), ActorConfig::named("journal"));
        let handle = actor.spawn(());

        let err = client
            .request_timeout(
                JournalRequest::Sleep(Duration::from_millis(100)),
                Duration::from_millis(10),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ActorError::RequestTimeout(_)));

        // The sleeping handler finishes and its reply goes nowhere.
        assert_eq!(client.request(JournalRequest::Len).await.unwrap(), 0);
        client.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    #[traced_test]
    async fn test_lifecycle_is_logged() {
        let (actor, client) = Actor::new(Journal::default(), ActorConfig::named("journal"));
        let handle = tokio::spawn(actor.run(()).in_current_span());

        client.send_event(String::new()).await.unwrap();
        client.stop();
        handle.await.unwrap();

        assert!(logs_contain("Actor started"));
        assert!(logs_contain("Event handler failed"));
        assert!(logs_contain("Shutdown"));
    }

    #[derive(Debug, Default)]
    struct Refuses;

    #[async_trait]
    impl ActorState for Refuses {
        type Event = ();
        type Request = ();
        type Reply = ();
        type Context = ();
        type Error = JournalError;

        async fn on_start(&mut self, _ctx: &()) -> Result<(), JournalError> {
            Err(JournalError("no".into()))
        }

        async fn handle_event(&mut self, _: (), _: &()) -> Result<(), JournalError> {
            Ok(())
        }

        async fn handle_request(&mut self, _: (), _: &()) -> Result<(), JournalError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_start_stops_the_actor() {
        let (actor, client) = Actor::new(Refuses, ActorConfig::named("refuses"));
        actor.spawn(()).await.unwrap();

        assert!(client.is_stopped());
        assert!(matches!(client.request(()).await, Err(ActorError::ActorStopped)));
    }
}
