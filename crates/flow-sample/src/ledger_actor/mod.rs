//! # Ledger Actor
//!
//! Account balances owned by a single [`Actor`]. Every credit, debit and
//! withdrawal runs inside the actor, so balances never see a lost update no
//! matter how many callers share the [`LedgerClient`](crate::clients::LedgerClient).
//!
//! ## Structure
//!
//! - [`messages`] - [`LedgerEvent`], [`LedgerRequest`] and [`LedgerReply`]
//! - [`error`] - [`LedgerError`] for domain and transport failures
//! - [`state`] - the [`Ledger`] state and its [`ActorState`](flow_framework::ActorState) impl
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Events vs. requests
//!
//! `Credit` and `Debit` are fire-and-forget: an overdrawing debit is refused,
//! logged and counted, and the sender never hears about it. `Withdraw` is the
//! request form of a debit, and its caller gets
//! [`LedgerError::InsufficientFunds`] back instead.
//!
//! ## Usage
//!
//! ```rust
//! use flow_framework::ActorConfig;
//! use flow_sample::clients::LedgerClient;
//! use flow_sample::ledger_actor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, generic_client) = ledger_actor::new(ActorConfig::named("ledger"));
//!     let client = LedgerClient::new(generic_client);
//!     let handle = actor.spawn(());
//!
//!     client.credit("alice", 100).await?;
//!     client.withdraw("alice", 40).await?;
//!     assert_eq!(client.balance("alice").await?, 60);
//!
//!     client.stop();
//!     handle.await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod messages;
pub mod state;

pub use error::*;
pub use messages::*;
pub use state::*;

use flow_framework::{Actor, ActorClient, ActorConfig};

/// Creates a new, empty Ledger actor and its client.
pub fn new(config: ActorConfig) -> (Actor<Ledger>, ActorClient<Ledger>) {
    Actor::new(Ledger::default(), config)
}
