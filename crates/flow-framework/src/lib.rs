//! # Flow Framework
//!
//! Two small concurrency building blocks on top of Tokio:
//!
//! - **[`Actor`]** – owns a piece of state and serializes every access to it
//!   through one bounded mailbox. Callers send fire-and-forget *events*,
//!   call/response *requests*, or closures, through a cloneable
//!   [`ActorClient`].
//! - **[`Pipeline`]** – a chain of transform stages with fan-out (N workers on
//!   one input), fan-in ([`Pipeline::merge`]) and cooperative cancellation
//!   broadcast to every stage.
//!
//! The two do not depend on each other. They share the [`CancelToken`] and the
//! close barrier that makes a multi-writer channel close exactly once.
//!
//! ## Why an actor?
//!
//! - Isolated state (no shared memory, no locks)
//! - Message-passing concurrency
//! - Sequential processing within each actor eliminates data races
//!
//! **Further Reading**:
//! - [Actors with Tokio](https://ryhl.io/blog/actors-with-tokio/)
//! - [Go Concurrency Patterns: Pipelines and cancellation](https://go.dev/blog/pipelines)
//!
//! ## Architecture Overview
//!
//! 1. **State Layer** ([`ActorState`]) - your data and its handlers
//! 2. **Runtime Layer** ([`Actor`], [`Pipeline`]) - tasks, channels, shutdown
//! 3. **Interface Layer** ([`ActorClient`], [`TypedClient`], [`Drain`]) - what callers touch
//!
//! ## Error Handling
//!
//! - A failing request handler answers with [`ActorError::HandlerFailure`];
//!   a failing event handler is logged. The actor keeps running either way.
//! - A failing transform is forwarded as a tagged [`StageFailure`] or cancels
//!   the pipeline, depending on [`FailurePolicy`].
//! - Nothing retries on its own.
//!
//! ## Concurrency Model
//!
//! - Each actor runs in its own Tokio task and handles one message at a time
//! - Each stage worker, source and merge forwarder is its own tracked task
//! - Cancellation is cooperative: checked at every channel send and receive
//!
//! ## Testing
//!
//! The [`mock`] module provides a client whose mailbox is handed to the test,
//! and a scripted [`mock::MockActor`], so code built on an [`ActorClient`]
//! can be tested without running the real state.

mod barrier;

pub mod actor;
pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod mock;
pub mod pipeline;
pub mod state;
pub mod tracing;
pub mod typed_client;

// Re-export core types for convenience
pub use actor::Actor;
pub use cancel::CancelToken;
pub use client::ActorClient;
pub use config::{ActorConfig, FailurePolicy, PipelineConfig};
pub use error::{ActorError, BoxError, PipelineError, StageFailure};
pub use message::{Envelope, Response};
pub use pipeline::{Drain, Item, Pipeline, Stream};
pub use state::ActorState;
pub use typed_client::TypedClient;
