//! # Ledger Client
//!
//! Provides a high‑level API for interacting with the ledger actor.
//! It wraps an `ActorClient<Ledger>` and exposes one method per operation,
//! so callers never match on [`LedgerReply`] themselves.
use crate::ledger_actor::{Ledger, LedgerError, LedgerEvent, LedgerReply, LedgerRequest};
use crate::model::{AccountId, LedgerSnapshot};
use flow_framework::{ActorClient, ActorError, TypedClient};
use tracing::{debug, instrument};

/// Client for interacting with the ledger actor.
#[derive(Clone)]
pub struct LedgerClient {
    inner: ActorClient<Ledger>,
}

impl LedgerClient {
    pub fn new(inner: ActorClient<Ledger>) -> Self {
        Self { inner }
    }
}

impl TypedClient<Ledger> for LedgerClient {
    type Error = LedgerError;

    fn inner(&self) -> &ActorClient<Ledger> {
        &self.inner
    }

    fn map_error(e: ActorError) -> Self::Error {
        LedgerError::from_actor(e)
    }
}

impl LedgerClient {
    /// Queues a credit. Returns once the event is in the mailbox.
    #[instrument(skip(self))]
    pub async fn credit(&self, account: &str, amount: u64) -> Result<(), LedgerError> {
        self.notify(LedgerEvent::Credit {
            account: AccountId::from(account),
            amount,
        })
        .await
    }

    /// Queues a debit. An overdrawing debit is refused inside the actor and
    /// only shows up in the logs and in [`LedgerSnapshot::rejected_debits`].
    #[instrument(skip(self))]
    pub async fn debit(&self, account: &str, amount: u64) -> Result<(), LedgerError> {
        self.notify(LedgerEvent::Debit {
            account: AccountId::from(account),
            amount,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn balance(&self, account: &str) -> Result<u64, LedgerError> {
        match self.call(LedgerRequest::Balance(AccountId::from(account))).await? {
            LedgerReply::Balance(balance) => Ok(balance),
            other => Err(unexpected(other)),
        }
    }

    /// Debits `amount` and returns the remaining balance.
    ///
    /// # Errors
    /// [`LedgerError::InsufficientFunds`] if the balance is too low.
    #[instrument(skip(self))]
    pub async fn withdraw(&self, account: &str, amount: u64) -> Result<u64, LedgerError> {
        debug!("Withdrawing {} from {}", amount, account);
        let request = LedgerRequest::Withdraw {
            account: AccountId::from(account),
            amount,
        };
        match self.call(request).await? {
            LedgerReply::Withdrawn(remaining) => Ok(remaining),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        match self.call(LedgerRequest::Snapshot).await? {
            LedgerReply::Snapshot(snapshot) => Ok(snapshot),
            other => Err(unexpected(other)),
        }
    }

    /// Stops the actor once everything already queued has been handled.
    pub fn stop(&self) {
        self.shutdown();
    }
}

fn unexpected(reply: LedgerReply) -> LedgerError {
    LedgerError::UnexpectedReply(format!("{reply:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_framework::mock::{create_mock_client, expect_event, expect_request, MockActor};

    #[tokio::test]
    async fn test_credit_sends_event() {
        let (client, mut receiver) = create_mock_client::<Ledger>(10);
        let ledger_client = LedgerClient::new(client);

        ledger_client.credit("alice", 25).await.unwrap();

        let event = expect_event(&mut receiver).await.expect("Expected Event");
        assert_eq!(
            event,
            LedgerEvent::Credit {
                account: AccountId::from("alice"),
                amount: 25
            }
        );
    }

    #[tokio::test]
    async fn test_withdraw_returns_remaining() {
        let (client, mut receiver) = create_mock_client::<Ledger>(10);
        let ledger_client = LedgerClient::new(client);

        let withdraw_task = tokio::spawn(async move { ledger_client.withdraw("alice", 5).await });

        let (request, responder) = expect_request(&mut receiver)
            .await
            .expect("Expected Request");
        assert_eq!(
            request,
            LedgerRequest::Withdraw {
                account: AccountId::from("alice"),
                amount: 5
            }
        );
        responder.send(Ok(LedgerReply::Withdrawn(15))).unwrap();

        assert_eq!(withdraw_task.await.unwrap().unwrap(), 15);
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds_is_domain_error() {
        let (client, mut receiver) = create_mock_client::<Ledger>(10);
        let ledger_client = LedgerClient::new(client);

        let withdraw_task = tokio::spawn(async move { ledger_client.withdraw("bob", 100).await });

        let (_, responder) = expect_request(&mut receiver)
            .await
            .expect("Expected Request");
        responder
            .send(Err(ActorError::handler(LedgerError::InsufficientFunds {
                account: AccountId::from("bob"),
                requested: 100,
                available: 40,
            })))
            .unwrap();

        match withdraw_task.await.unwrap() {
            Err(LedgerError::InsufficientFunds { available, .. }) => assert_eq!(available, 40),
            other => panic!("Expected InsufficientFunds, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_reply_kind_is_reported() {
        let mut mock = MockActor::<Ledger>::new();
        mock.expect_request().return_ok(LedgerReply::Balance(1));
        let ledger_client = LedgerClient::new(mock.client());

        let err = ledger_client.snapshot().await.unwrap_err();
        assert!(matches!(err, LedgerError::UnexpectedReply(_)));
        mock.verify();
    }

    #[tokio::test]
    async fn test_mock_actor_records_calls() {
        let mut mock = MockActor::<Ledger>::new();
        mock.expect_event();
        mock.expect_request().return_ok(LedgerReply::Balance(7));
        let ledger_client = LedgerClient::new(mock.client());

        ledger_client.debit("carol", 3).await.unwrap();
        assert_eq!(ledger_client.balance("carol").await.unwrap(), 7);

        mock.verify();
        assert_eq!(mock.take_requests(), vec![LedgerRequest::Balance(AccountId::from("carol"))]);
        assert_eq!(mock.take_events().len(), 1);
    }

    #[tokio::test]
    async fn test_stopped_actor_maps_to_transport_error() {
        let mut mock = MockActor::<Ledger>::new();
        mock.expect_request().return_err(ActorError::ActorStopped);
        let ledger_client = LedgerClient::new(mock.client());

        let err = ledger_client.balance("dave").await.unwrap_err();
        assert!(matches!(err, LedgerError::Actor(ActorError::ActorStopped)));
    }
}
