//! Messages accepted by the Ledger actor.

use crate::model::{AccountId, LedgerSnapshot};

/// Fire-and-forget balance changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// Adds `amount` to the account, opening it if needed.
    Credit { account: AccountId, amount: u64 },
    /// Removes `amount` from the account. Refused if it would overdraw.
    Debit { account: AccountId, amount: u64 },
}

/// Call/response operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerRequest {
    /// Current balance. Unknown accounts have a balance of zero.
    Balance(AccountId),
    /// Debit that reports failure to the caller.
    ///
    /// # Errors
    /// Fails with [`InsufficientFunds`](super::LedgerError::InsufficientFunds)
    /// if the balance is lower than `amount`.
    Withdraw { account: AccountId, amount: u64 },
    /// Copy of every balance.
    Snapshot,
}

/// Replies, matching [`LedgerRequest`] 1:1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerReply {
    Balance(u64),
    /// Balance left after the withdrawal.
    Withdrawn(u64),
    Snapshot(LedgerSnapshot),
}
