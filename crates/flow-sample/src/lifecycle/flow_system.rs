use crate::clients::LedgerClient;
use crate::config::AppConfig;
use crate::digest::{digest_tree, DigestError, Digests};
use crate::ledger_actor::{self, Ledger};
use crate::model::LedgerSnapshot;
use crate::squares;
use flow_framework::PipelineError;
use std::path::Path;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum SystemError {
    /// The actor task panicked or was aborted.
    #[error("Actor task failed: {0}")]
    ActorTask(#[from] tokio::task::JoinError),
}

/// Runtime orchestrator for the sample: one ledger actor plus pipelines that
/// share the configured channel capacity and failure policy.
///
/// # Example
///
/// ```rust
/// use flow_sample::config::AppConfig;
/// use flow_sample::lifecycle::FlowSystem;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let system = FlowSystem::new(AppConfig::default());
///     system.ledger.credit("alice", 10).await?;
///     assert_eq!(system.square_all(vec![1, 2, 3]).await?, vec![1, 4, 9]);
///
///     let snapshot = system.shutdown().await?;
///     assert_eq!(snapshot.total(), 10);
///     Ok(())
/// }
/// ```
pub struct FlowSystem {
    /// Client for the ledger actor. Clone it freely.
    pub ledger: LedgerClient,
    config: AppConfig,
    ledger_handle: JoinHandle<Ledger>,
}

impl FlowSystem {
    /// Creates the ledger actor and spawns it on the current runtime.
    pub fn new(config: AppConfig) -> Self {
        let (actor, client) = ledger_actor::new(config.ledger.clone());
        let ledger_handle = actor.spawn(());
        info!(
            mailbox_capacity = config.ledger.mailbox_capacity,
            channel_capacity = config.pipeline.channel_capacity,
            digest_workers = config.digest_workers,
            "Flow system started"
        );
        Self {
            ledger: LedgerClient::new(client),
            config,
            ledger_handle,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Squares `numbers` in order with a single worker.
    pub async fn square_all(&self, numbers: Vec<u64>) -> Result<Vec<u64>, PipelineError> {
        squares::square_all(numbers, 1, self.config.pipeline.clone()).await
    }

    /// Squares `numbers` through two merged stages; order is unspecified.
    pub async fn square_fan_in(&self, numbers: Vec<u64>) -> Result<Vec<u64>, PipelineError> {
        squares::square_fan_in(numbers, self.config.pipeline.clone()).await
    }

    /// Digests the tree under `root` with the configured worker count.
    pub async fn digest(&self, root: impl AsRef<Path>) -> Result<Digests, DigestError> {
        digest_tree(root, self.config.digest_workers, self.config.pipeline.clone()).await
    }

    /// Stops the ledger, waits for its mailbox to drain and returns the final
    /// balances.
    pub async fn shutdown(self) -> Result<LedgerSnapshot, SystemError> {
        info!("Shutting down flow system...");
        self.ledger.stop();

        let ledger = self.ledger_handle.await.map_err(|e| {
            error!(error = %e, "Ledger task failed");
            SystemError::from(e)
        })?;

        let snapshot = ledger.snapshot();
        info!(accounts = snapshot.balances.len(), "Flow system shutdown complete.");
        Ok(snapshot)
    }
}
