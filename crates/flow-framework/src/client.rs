//! # Generic Client
//!
//! This module defines the client half of the actor: the only way to reach
//! an actor's state from outside its task.

use crate::cancel::CancelToken;
use crate::error::ActorError;
use crate::message::{Envelope, Exec};
use crate::state::ActorState;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tracing::debug;

/// A cloneable, type-safe handle to an [`Actor`](crate::Actor).
///
/// * **Cloneable** – holds a sender and the stop token, so cloning is cheap.
/// * **Ordered** – messages from one client arrive in the order they were sent.
/// * **Backpressure** – `send_event`, `request` and `exec` wait while the
///   mailbox is full; `try_send_event` fails instead.
pub struct ActorClient<S: ActorState> {
    sender: mpsc::Sender<Envelope<S>>,
    stop: CancelToken,
    request_timeout: Option<Duration>,
}

impl<S: ActorState> Clone for ActorClient<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            stop: self.stop.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<S: ActorState> ActorClient<S> {
    pub fn new(
        sender: mpsc::Sender<Envelope<S>>,
        stop: CancelToken,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            sender,
            stop,
            request_timeout,
        }
    }

    /// Enqueues a fire-and-forget event.
    ///
    /// Returns once the event is in the mailbox, not once it is handled.
    pub async fn send_event(&self, event: S::Event) -> Result<(), ActorError> {
        self.enqueue(Envelope::Event(event), ActorError::MailboxClosed)
            .await
    }

    /// Enqueues an event without waiting for mailbox space.
    pub fn try_send_event(&self, event: S::Event) -> Result<(), ActorError> {
        if self.stop.is_cancelled() {
            return Err(ActorError::MailboxClosed);
        }
        self.sender
            .try_send(Envelope::Event(event))
            .map_err(|e| match e {
                TrySendError::Full(_) => ActorError::MailboxFull,
                TrySendError::Closed(_) => ActorError::MailboxClosed,
            })
    }

    /// Sends a request and waits for its reply, applying the configured
    /// default deadline if there is one.
    pub async fn request(&self, payload: S::Request) -> Result<S::Reply, ActorError> {
        self.with_deadline(self.request_timeout, self.call(payload))
            .await
    }

    /// Sends a request and waits at most `timeout` for the reply.
    ///
    /// On timeout only the wait is abandoned. The actor still runs the
    /// handler; its reply is dropped.
    pub async fn request_timeout(
        &self,
        payload: S::Request,
        timeout: Duration,
    ) -> Result<S::Reply, ActorError> {
        self.with_deadline(Some(timeout), self.call(payload)).await
    }

    /// Runs `f` against the actor's state inside the actor's task and returns
    /// its result. Ordered with events and requests like any other message.
    ///
    /// A panic in `f` is reported as [`ActorError::HandlerFailure`].
    pub async fn exec<R, F>(&self, f: F) -> Result<R, ActorError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (respond_to, response) = oneshot::channel();
        let job: Exec<S> = Box::new(move |state: &mut S| {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| f(state)))
                .map_err(|_| ActorError::handler("exec closure panicked"));
            let _ = respond_to.send(result);
        });
        let call = async {
            self.enqueue(Envelope::Exec(job), ActorError::ActorStopped)
                .await?;
            response.await.map_err(|_| ActorError::ActorStopped)?
        };
        self.with_deadline(self.request_timeout, call).await
    }

    /// Asks the actor to stop. Already-queued messages are still handled.
    /// Calling it again has no further effect.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled() || self.sender.is_closed()
    }

    /// Free mailbox slots right now.
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }

    async fn call(&self, payload: S::Request) -> Result<S::Reply, ActorError> {
        let (respond_to, response) = oneshot::channel();
        self.enqueue(
            Envelope::Request {
                payload,
                respond_to,
            },
            ActorError::ActorStopped,
        )
        .await?;
        response.await.map_err(|_| ActorError::ActorStopped)?
    }

    /// Puts `envelope` in the mailbox, racing the stop signal so a sender
    /// blocked on a full mailbox is released as soon as the actor stops.
    async fn enqueue(&self, envelope: Envelope<S>, closed: ActorError) -> Result<(), ActorError> {
        if self.stop.is_cancelled() {
            return Err(closed);
        }
        let kind = envelope.kind();
        tokio::select! {
            biased;
            _ = self.stop.cancelled() => {
                debug!(actor = self.stop.label(), kind, "Stopped while waiting for mailbox space");
                Err(closed)
            }
            sent = self.sender.send(envelope) => sent.map_err(|_| closed),
        }
    }

    async fn with_deadline<T>(
        &self,
        deadline: Option<Duration>,
        call: impl Future<Output = Result<T, ActorError>>,
    ) -> Result<T, ActorError> {
        match deadline {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| ActorError::RequestTimeout(timeout))?,
            None => call.await,
        }
    }
}
