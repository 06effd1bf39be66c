//! [`ActorState`] implementation for the ledger.
//!
//! Handlers run one at a time inside the actor, so they mutate the balance map
//! directly.

use super::error::LedgerError;
use super::messages::{LedgerEvent, LedgerReply, LedgerRequest};
use crate::model::{AccountId, LedgerSnapshot};
use async_trait::async_trait;
use flow_framework::ActorState;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct Ledger {
    balances: BTreeMap<AccountId, u64>,
    rejected_debits: u64,
}

impl Ledger {
    pub fn balance(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            balances: self.balances.clone(),
            rejected_debits: self.rejected_debits,
        }
    }

    fn credit(&mut self, account: AccountId, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let balance = self.balances.entry(account.clone()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(account))?;
        Ok(*balance)
    }

    fn debit(&mut self, account: AccountId, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let available = self.balance(&account);
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                account,
                requested: amount,
                available,
            });
        }
        let remaining = available - amount;
        self.balances.insert(account, remaining);
        Ok(remaining)
    }
}

#[async_trait]
impl ActorState for Ledger {
    type Event = LedgerEvent;
    type Request = LedgerRequest;
    type Reply = LedgerReply;
    type Context = ();
    type Error = LedgerError;

    async fn handle_event(&mut self, event: LedgerEvent, _ctx: &()) -> Result<(), LedgerError> {
        match event {
            LedgerEvent::Credit { account, amount } => {
                let balance = self.credit(account.clone(), amount)?;
                debug!(%account, amount, balance, "Credited");
            }
            LedgerEvent::Debit { account, amount } => {
                match self.debit(account.clone(), amount) {
                    Ok(balance) => debug!(%account, amount, balance, "Debited"),
                    Err(e) => {
                        // Nobody waits on an event; count the refusal so
                        // snapshots show it.
                        self.rejected_debits += 1;
                        return Err(e);
                    }
                }
            }
        }
        Ok(())
    }

    async fn handle_request(
        &mut self,
        request: LedgerRequest,
        _ctx: &(),
    ) -> Result<LedgerReply, LedgerError> {
        match request {
            LedgerRequest::Balance(account) => Ok(LedgerReply::Balance(self.balance(&account))),
            LedgerRequest::Withdraw { account, amount } => {
                let remaining = self.debit(account.clone(), amount)?;
                debug!(%account, amount, remaining, "Withdrawn");
                Ok(LedgerReply::Withdrawn(remaining))
            }
            LedgerRequest::Snapshot => Ok(LedgerReply::Snapshot(self.snapshot())),
        }
    }

    async fn on_stop(&mut self, _ctx: &()) {
        info!(
            accounts = self.balances.len(),
            total = self.balances.values().sum::<u64>(),
            rejected_debits = self.rejected_debits,
            "Ledger closed"
        );
    }
}
