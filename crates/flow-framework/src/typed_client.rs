//! # TypedClient Trait
//!
//! Provides a common interface for domain-specific clients, adding default
//! `notify`, `call` and `shutdown` methods on top of a generic [`ActorClient`]
//! and mapping framework errors into the domain's own error type.
use crate::{ActorClient, ActorError, ActorState};
use async_trait::async_trait;

/// Trait for domain clients that wrap an [`ActorClient`].
///
/// # Example
///
/// ```rust
/// use flow_framework::{ActorClient, ActorError, ActorState, TypedClient};
/// use async_trait::async_trait;
///
/// #[derive(Default)]
/// struct Counter { value: i64 }
///
/// #[derive(Debug, thiserror::Error)]
/// enum CounterError {
///     #[error("actor: {0}")]
///     Actor(#[from] ActorError),
/// }
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
///     async fn handle_request(&mut self, _: (), _: &()) -> Result<i64, CounterError> {
///         Ok(self.value)
///     }
/// }
///
/// struct CounterClient { inner: ActorClient<Counter> }
///
/// impl TypedClient<Counter> for CounterClient {
///     type Error = CounterError;
///
///     fn inner(&self) -> &ActorClient<Counter> {
///         &self.inner
///     }
///
///     fn map_error(e: ActorError) -> CounterError {
///         CounterError::Actor(e)
///     }
/// }
///
/// async fn usage(client: CounterClient) -> Result<i64, CounterError> {
///     // notify() and call() are provided automatically!
///     client.notify(5).await?;
///     client.call(()).await
/// }
/// ```
#[async_trait]
pub trait TypedClient<S: ActorState>: Send + Sync {
    /// The domain-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic client.
    fn inner(&self) -> &ActorClient<S>;

    /// Map framework errors to the domain error type.
    fn map_error(e: ActorError) -> Self::Error;

    /// Send an event.
    #[tracing::instrument(skip(self))]
    async fn notify(&self, event: S::Event) -> Result<(), Self::Error> {
        tracing::debug!("Sending event");
        self.inner().send_event(event).await.map_err(Self::map_error)
    }

    /// Send a request and wait for the reply.
    #[tracing::instrument(skip(self))]
    async fn call(&self, request: S::Request) -> Result<S::Reply, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().request(request).await.map_err(Self::map_error)
    }

    /// Ask the actor to stop after draining its mailbox.
    fn shutdown(&self) {
        self.inner().stop();
    }
}
