//! Error types for the Ledger actor.

use crate::model::AccountId;
use flow_framework::ActorError;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The debit or withdrawal exceeds the balance.
    #[error("Insufficient funds in {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        account: AccountId,
        requested: u64,
        available: u64,
    },

    /// Zero-amount credits, debits and withdrawals are refused.
    #[error("Invalid amount: {0}")]
    InvalidAmount(u64),

    /// The credit would overflow the balance.
    #[error("Balance overflow in {0}")]
    Overflow(AccountId),

    /// The actor answered with a reply of the wrong kind.
    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    /// An error occurred while communicating with the actor.
    #[error("Actor communication error: {0}")]
    Actor(#[from] ActorError),
}

impl LedgerError {
    /// Recovers the domain error a request handler returned, if that is what
    /// `error` carries.
    pub fn from_actor(error: ActorError) -> Self {
        match error {
            ActorError::HandlerFailure(inner) => match inner.downcast::<LedgerError>() {
                Ok(domain) => *domain,
                Err(other) => Self::Actor(ActorError::HandlerFailure(other)),
            },
            other => Self::Actor(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_actor_unwraps_domain_error() {
        let wrapped = ActorError::handler(LedgerError::InvalidAmount(0));
        assert!(matches!(
            LedgerError::from_actor(wrapped),
            LedgerError::InvalidAmount(0)
        ));
    }

    #[test]
    fn test_from_actor_keeps_transport_errors() {
        assert!(matches!(
            LedgerError::from_actor(ActorError::ActorStopped),
            LedgerError::Actor(ActorError::ActorStopped)
        ));

        let foreign = ActorError::handler(std::io::Error::other("disk"));
        match LedgerError::from_actor(foreign) {
            LedgerError::Actor(ActorError::HandlerFailure(e)) => assert_eq!(e.to_string(), "disk"),
            other => panic!("expected handler failure, got {other:?}"),
        }
    }
}
