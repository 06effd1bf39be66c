//! Plain data carried by the ledger actor's messages.

pub mod account;

pub use account::*;
