use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Type-safe identifier for ledger accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "account_{}", self.0)
    }
}

/// Point-in-time copy of the whole ledger.
///
/// Balances are in minor units (cents). Accounts appear once they have been
/// credited, even if their balance is back at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub balances: BTreeMap<AccountId, u64>,
    /// Debit events refused because they would overdraw an account.
    pub rejected_debits: u64,
}

impl LedgerSnapshot {
    /// Sum of every balance.
    pub fn total(&self) -> u64 {
        self.balances.values().sum()
    }
}
