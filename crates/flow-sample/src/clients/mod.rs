//! Type-safe wrappers around [`ActorClient`](flow_framework::ActorClient).

pub mod ledger_client;

pub use ledger_client::*;
