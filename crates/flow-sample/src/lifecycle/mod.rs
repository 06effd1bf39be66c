//! # System Lifecycle & Orchestration
//!
//! Individual actors and pipelines are simple; starting them with the right
//! configuration and stopping them in the right order is where the care goes.
//! [`FlowSystem`] is that conductor for the sample:
//!
//! 1. **Creation** - build the ledger actor from [`AppConfig`](crate::config::AppConfig)
//! 2. **Start** - spawn it with its context (none, for the ledger)
//! 3. **Use** - hand out the [`LedgerClient`](crate::clients::LedgerClient)
//!    and run pipelines with the shared pipeline settings
//! 4. **Shutdown** - stop, let the mailbox drain, await the task
//!
//! ```rust,ignore
//! let system = FlowSystem::new(AppConfig::from_env()?);
//! system.ledger.credit("alice", 100).await?;
//! let digests = system.digest(".").await?;
//! let final_snapshot = system.shutdown().await?;
//! ```
//!
//! ## Graceful Shutdown
//!
//! Stopping is explicit rather than relying on every client being dropped:
//! clones of the client may live in spawned tasks the system does not own.
//!
//! 1. **Stop** - the actor closes its mailbox; late senders get an error
//! 2. **Drain** - messages already queued are still handled
//! 3. **Await** - the task returns the final state, read back as a snapshot
//!
//! ## Observability
//!
//! Call [`setup_tracing`] once at start-up; `RUST_LOG` picks the level:
//!
//! ```bash
//! RUST_LOG=info cargo run      # Lifecycle only
//! RUST_LOG=debug cargo run     # Every message and stage
//! ```

pub mod flow_system;

pub use flow_framework::tracing::setup_tracing;
pub use flow_system::*;
