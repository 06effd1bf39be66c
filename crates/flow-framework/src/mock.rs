//! # Mock Framework & Testing Guide
//!
//! Two ways to test code that talks to an actor without running the real
//! state:
//!
//! | | Raw receiver | `MockActor` |
//! |---|---|---|
//! | **Setup** | [`create_mock_client`] | [`MockActor::new`] + expectations |
//! | **Control** | Test answers each message by hand | Replies queued up front |
//! | **Use Case** | Asserting on exact payloads | Scripted conversations, error injection |
//!
//! ## Pattern 0: Raw receiver
//!
//! ```rust
//! use flow_framework::mock::{create_mock_client, expect_request};
//! use flow_framework::ActorState;
//! use async_trait::async_trait;
//!
//! struct Store;
//! #[derive(Debug, thiserror::Error)] #[error("store")] struct StoreError;
//!
//! #[async_trait]
//! impl ActorState for Store {
//!     type Event = (); type Request = String; type Reply = usize;
//!     type Context = (); type Error = StoreError;
//!     async fn handle_event(&mut self, _: (), _: &()) -> Result<(), StoreError> { Ok(()) }
//!     async fn handle_request(&mut self, r: String, _: &()) -> Result<usize, StoreError> { Ok(r.len()) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (client, mut receiver) = create_mock_client::<Store>(8);
//!     let call = tokio::spawn(async move { client.request("abc".into()).await });
//!
//!     let (payload, respond_to) = expect_request(&mut receiver).await.unwrap();
//!     assert_eq!(payload, "abc");
//!     respond_to.send(Ok(99)).unwrap();
//!
//!     assert_eq!(call.await.unwrap().unwrap(), 99);
//! }
//! ```
//!
//! ## Pattern 1: Scripted mock
//!
//! ```rust
//! use flow_framework::mock::MockActor;
//! use flow_framework::{ActorError, ActorState};
//! use async_trait::async_trait;
//!
//! struct Store;
//! #[derive(Debug, thiserror::Error)] #[error("store")] struct StoreError;
//!
//! #[async_trait]
//! impl ActorState for Store {
//!     type Event = u32; type Request = (); type Reply = u32;
//!     type Context = (); type Error = StoreError;
//!     async fn handle_event(&mut self, _: u32, _: &()) -> Result<(), StoreError> { Ok(()) }
//!     async fn handle_request(&mut self, _: (), _: &()) -> Result<u32, StoreError> { Ok(0) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockActor::<Store>::new();
//!     mock.expect_event();
//!     mock.expect_request().return_ok(7);
//!     mock.expect_request().return_err(ActorError::ActorStopped);
//!
//!     let client = mock.client();
//!     client.send_event(1).await.unwrap();
//!     assert_eq!(client.request(()).await.unwrap(), 7);
//!     assert!(client.request(()).await.is_err());
//!
//!     mock.verify();
//!     assert_eq!(mock.take_events(), vec![1]);
//! }
//! ```

use crate::cancel::CancelToken;
use crate::client::ActorClient;
use crate::error::ActorError;
use crate::message::{Envelope, Response};
use crate::state::ActorState;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Creates a client whose mailbox is handed straight to the test.
pub fn create_mock_client<S: ActorState>(
    capacity: usize,
) -> (ActorClient<S>, mpsc::Receiver<Envelope<S>>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let client = ActorClient::new(sender, CancelToken::new("mock"), None);
    (client, receiver)
}

/// Receives the next message and returns it if it is an event.
pub async fn expect_event<S: ActorState>(
    receiver: &mut mpsc::Receiver<Envelope<S>>,
) -> Option<S::Event> {
    match receiver.recv().await? {
        Envelope::Event(event) => Some(event),
        _ => None,
    }
}

/// Receives the next message and returns it if it is a request.
pub async fn expect_request<S: ActorState>(
    receiver: &mut mpsc::Receiver<Envelope<S>>,
) -> Option<(S::Request, Response<S::Reply>)> {
    match receiver.recv().await? {
        Envelope::Request {
            payload,
            respond_to,
        } => Some((payload, respond_to)),
        _ => None,
    }
}

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

enum Expectation<S: ActorState> {
    Event,
    Request {
        response: Result<S::Reply, ActorError>,
    },
}

struct Shared<S: ActorState> {
    expectations: VecDeque<Expectation<S>>,
    events: Vec<S::Event>,
    requests: Vec<S::Request>,
    mismatch: Option<String>,
}

/// A mock actor that answers from a queue of expectations, in order.
///
/// A message that does not match the next expectation is recorded as a
/// mismatch and reported by [`verify`](Self::verify); request callers get
/// [`ActorError::ActorStopped`] in that case.
pub struct MockActor<S: ActorState> {
    client: ActorClient<S>,
    shared: Arc<Mutex<Shared<S>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<S: ActorState> Default for MockActor<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ActorState> MockActor<S> {
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<Envelope<S>>(100);
        let shared = Arc::new(Mutex::new(Shared {
            expectations: VecDeque::new(),
            events: Vec::new(),
            requests: Vec::new(),
            mismatch: None,
        }));
        let shared_clone = shared.clone();

        let handle = tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                let mut shared = shared_clone.lock().expect("mock state poisoned");
                let expectation = shared.expectations.pop_front();
                match (envelope, expectation) {
                    (Envelope::Event(event), Some(Expectation::Event)) => {
                        shared.events.push(event);
                    }
                    (
                        Envelope::Request {
                            payload,
                            respond_to,
                        },
                        Some(Expectation::Request { response }),
                    ) => {
                        shared.requests.push(payload);
                        let _ = respond_to.send(response);
                    }
                    (envelope, _) => {
                        if shared.mismatch.is_none() {
                            shared.mismatch = Some(format!("unexpected {}", envelope.kind()));
                        }
                    }
                }
            }
        });

        Self {
            client: ActorClient::new(sender, CancelToken::new("mock"), None),
            shared,
            _handle: handle,
        }
    }

    /// Returns a client for use in tests.
    pub fn client(&self) -> ActorClient<S> {
        self.client.clone()
    }

    /// Expects an event; it is recorded for [`take_events`](Self::take_events).
    pub fn expect_event(&mut self) {
        self.lock().expectations.push_back(Expectation::Event);
    }

    /// Expects a request.
    pub fn expect_request(&mut self) -> RequestExpectationBuilder<S> {
        RequestExpectationBuilder {
            shared: self.shared.clone(),
        }
    }

    /// Events received so far, in arrival order.
    pub fn take_events(&self) -> Vec<S::Event> {
        std::mem::take(&mut self.lock().events)
    }

    /// Request payloads received so far, in arrival order.
    pub fn take_requests(&self) -> Vec<S::Request> {
        std::mem::take(&mut self.lock().requests)
    }

    /// Verifies that every expectation was met and nothing unexpected arrived.
    pub fn verify(&self) {
        let shared = self.lock();
        if let Some(mismatch) = &shared.mismatch {
            panic!("Mock received an {mismatch}");
        }
        if !shared.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                shared.expectations.len()
            );
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared<S>> {
        self.shared.lock().expect("mock state poisoned")
    }
}

/// Builder for request expectations.
pub struct RequestExpectationBuilder<S: ActorState> {
    shared: Arc<Mutex<Shared<S>>>,
}

impl<S: ActorState> RequestExpectationBuilder<S> {
    /// Sets the expectation to return a successful reply.
    pub fn return_ok(self, reply: S::Reply) {
        self.push(Ok(reply));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ActorError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<S::Reply, ActorError>) {
        self.shared
            .lock()
            .expect("mock state poisoned")
            .expectations
            .push_back(Expectation::Request { response });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Inbox;

    #[derive(Debug, thiserror::Error)]
    #[error("inbox error")]
    struct InboxError;

    #[async_trait]
    impl ActorState for Inbox {
        type Event = String;
        type Request = u32;
        type Reply = String;
        type Context = ();
        type Error = InboxError;

        async fn handle_event(&mut self, _: String, _: &()) -> Result<(), InboxError> {
            Ok(())
        }

        async fn handle_request(&mut self, _: u32, _: &()) -> Result<String, InboxError> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_raw_receiver_helpers() {
        let (client, mut receiver) = create_mock_client::<Inbox>(4);

        client.send_event("hello".into()).await.unwrap();
        assert_eq!(expect_event(&mut receiver).await.as_deref(), Some("hello"));

        let task = tokio::spawn(async move { client.request(3).await });
        let (payload, respond_to) = expect_request(&mut receiver)
            .await
            .expect("Expected Request");
        assert_eq!(payload, 3);
        respond_to.send(Ok("three".into())).unwrap();
        assert_eq!(task.await.unwrap().unwrap(), "three");
    }

    #[tokio::test]
    async fn test_mock_actor_with_expectations() {
        let mut mock = MockActor::<Inbox>::new();
        mock.expect_event();
        mock.expect_request().return_ok("one".into());
        mock.expect_request().return_err(ActorError::MailboxFull);

        let client = mock.client();
        client.send_event("note".into()).await.unwrap();
        assert_eq!(client.request(1).await.unwrap(), "one");
        assert!(matches!(client.request(2).await, Err(ActorError::MailboxFull)));

        mock.verify();
        assert_eq!(mock.take_events(), vec!["note".to_string()]);
        assert_eq!(mock.take_requests(), vec![1, 2]);
    }

    #[tokio::test]
    #[should_panic(expected = "Mock received an unexpected request")]
    async fn test_mock_actor_flags_unexpected_message() {
        let mock = MockActor::<Inbox>::new();
        let client = mock.client();
        assert!(matches!(client.request(1).await, Err(ActorError::ActorStopped)));
        mock.verify();
    }
}
