//! # ActorState Trait
//!
//! The `ActorState` trait is the contract a piece of state implements to be
//! owned by an [`Actor`](crate::Actor). It names the event, request and reply
//! types the actor accepts, the context injected at run time, and the error
//! its handlers may return. The actor calls these handlers one message at a
//! time, so implementations mutate `self` freely without locks.
//!
//! # Provided Methods (Hooks)
//! - [`ActorState::on_start`]
//! - [`ActorState::on_stop`]
//!
//! Both default to doing nothing.

use async_trait::async_trait;
use std::fmt::Debug;

/// State owned and serialized by an [`Actor`](crate::Actor).
///
/// # Async & Context
/// Handlers are `async` so they can await other actors or I/O. The `Context`
/// type is handed to [`Actor::run`](crate::Actor::run) rather than to
/// [`Actor::new`](crate::Actor::new), which lets two actors hold each other's
/// clients without a construction cycle.
///
/// # Self-calls
/// A handler must not `request` its own actor: the loop is busy running that
/// handler, so the reply can never be produced and the caller deadlocks (or
/// times out if a deadline is set). Sending an *event* to itself is fine as
/// long as the mailbox has room.
#[async_trait]
pub trait ActorState: Send + 'static {
    /// Fire-and-forget notifications.
    type Event: Send + Debug + 'static;

    /// Call/response payloads.
    type Request: Send + Debug + 'static;

    /// The value a successful request produces.
    type Reply: Send + Debug + 'static;

    /// Runtime dependencies injected into every handler.
    /// Use `()` if none are needed.
    type Context: Send + Sync + 'static;

    /// Handler error. Request failures reach the caller as
    /// [`ActorError::HandlerFailure`](crate::ActorError::HandlerFailure);
    /// event failures are logged.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called once, before the first message.
    async fn on_start(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn handle_event(
        &mut self,
        event: Self::Event,
        ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    async fn handle_request(
        &mut self,
        request: Self::Request,
        ctx: &Self::Context,
    ) -> Result<Self::Reply, Self::Error>;

    /// Called once after the mailbox has been drained.
    async fn on_stop(&mut self, _ctx: &Self::Context) {}
}
