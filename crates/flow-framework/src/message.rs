//! # Mailbox Messages
//!
//! Everything an actor receives travels in one [`Envelope`] enum through one
//! mailbox, which keeps a single total order across events, requests and
//! closure actions.

use crate::error::ActorError;
use crate::state::ActorState;
use std::fmt;
use tokio::sync::oneshot;

/// Type alias for the one-shot response slot bound to a request.
pub type Response<T> = oneshot::Sender<Result<T, ActorError>>;

/// A closure shipped into the actor and run against its state.
pub type Exec<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// A message waiting in an actor's mailbox.
pub enum Envelope<S: ActorState> {
    /// Fire-and-forget; no reply slot exists.
    Event(S::Event),
    /// Call/response; `respond_to` is fulfilled exactly once.
    Request {
        payload: S::Request,
        respond_to: Response<S::Reply>,
    },
    /// Closure action. The closure carries its own reply slot.
    Exec(Exec<S>),
}

impl<S: ActorState> Envelope<S> {
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Event(_) => "event",
            Envelope::Request { .. } => "request",
            Envelope::Exec(_) => "exec",
        }
    }
}

impl<S: ActorState> fmt::Debug for Envelope<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Envelope::Event(event) => f.debug_tuple("Event").field(event).finish(),
            Envelope::Request { payload, .. } => {
                f.debug_struct("Request").field("payload", payload).finish()
            }
            Envelope::Exec(_) => f.write_str("Exec"),
        }
    }
}
