//! # Framework Errors
//!
//! This module defines the error types shared by the actor and the pipeline.
//! By centralizing error definitions, every caller sees the same taxonomy no
//! matter which state type or transform it plugs in.

use std::time::Duration;

/// Boxed caller-defined error, as produced by handlers and transforms.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned to callers of an [`ActorClient`](crate::ActorClient).
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// The actor stopped; events are no longer accepted.
    #[error("Mailbox closed")]
    MailboxClosed,
    /// The mailbox is at capacity and the caller asked not to wait.
    #[error("Mailbox full")]
    MailboxFull,
    /// The actor stopped before accepting the request or before replying.
    #[error("Actor stopped")]
    ActorStopped,
    /// The caller's deadline elapsed before a reply arrived.
    #[error("Request timed out after {0:?}")]
    RequestTimeout(Duration),
    /// The request handler failed. The actor keeps running.
    #[error("Handler failure: {0}")]
    HandlerFailure(BoxError),
}

impl ActorError {
    /// Wraps a handler error.
    pub fn handler<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::HandlerFailure(error.into())
    }

    /// True for the errors that mean the actor is gone for good.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::MailboxClosed | Self::ActorStopped)
    }
}

/// A transform failed on one item.
///
/// Under [`FailurePolicy::Forward`](crate::FailurePolicy::Forward) this value
/// travels downstream in place of the item; under
/// [`FailurePolicy::FailFast`](crate::FailurePolicy::FailFast) the first one
/// cancels the pipeline and is reported by [`Drain::collect`](crate::Drain::collect).
#[derive(Debug, thiserror::Error)]
#[error("Stage `{stage}` failed: {source}")]
pub struct StageFailure {
    /// Name of the stage whose transform failed.
    pub stage: String,
    #[source]
    pub source: BoxError,
}

impl StageFailure {
    pub fn new(stage: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            stage: stage.into(),
            source: source.into(),
        }
    }
}

/// Whole-pipeline outcomes reported by the drain.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Fail-fast policy: a transform failed and cancelled the pipeline.
    #[error(transparent)]
    StageTransformFailure(#[from] StageFailure),
    /// The pipeline was cancelled; the results are incomplete.
    #[error("Pipeline cancelled")]
    PipelineCancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_classification() {
        assert!(ActorError::MailboxClosed.is_stopped());
        assert!(ActorError::ActorStopped.is_stopped());
        assert!(!ActorError::MailboxFull.is_stopped());
        assert!(!ActorError::RequestTimeout(Duration::from_millis(5)).is_stopped());
    }

    #[test]
    fn test_stage_failure_display_names_stage() {
        let failure = StageFailure::new("parse", "bad digit");
        assert_eq!(failure.to_string(), "Stage `parse` failed: bad digit");

        let err = PipelineError::from(failure);
        assert_eq!(err.to_string(), "Stage `parse` failed: bad digit");
    }
}
