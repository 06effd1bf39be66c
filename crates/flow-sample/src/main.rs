//! # Flow Sample
//!
//! Runs both framework components end to end:
//!
//! 1. **Ledger** - concurrent credits and debits through one actor, including
//!    a refused overdraft and a failed withdrawal.
//! 2. **Squares** - the same numbers through a single-worker stage and through
//!    two merged stages.
//! 3. **Digest** - SHA-256 of every file under `DIR` (default `.`), printed
//!    sorted by path with timings.
//!
//! ```bash
//! RUST_LOG=info cargo run -p flow-sample -- src
//! ```
//!
//! Settings come from `FLOW_*` variables, see [`AppConfig`].

use flow_framework::tracing::setup_tracing;
use flow_sample::config::AppConfig;
use flow_sample::ledger_actor::LedgerError;
use flow_sample::lifecycle::FlowSystem;
use std::error::Error;
use std::time::Instant;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Setup tracing once for the entire application
    setup_tracing();

    let root = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let config = AppConfig::from_env()?;
    info!(root = %root, "Starting flow sample");

    let system = FlowSystem::new(config);

    // 1. Ledger
    let span = tracing::info_span!("ledger_demo");
    async {
        let tellers: Vec<_> = (0..4)
            .map(|_| {
                let ledger = system.ledger.clone();
                tokio::spawn(async move {
                    for _ in 0..25 {
                        ledger.credit("alice", 4).await?;
                    }
                    ledger.credit("bob", 50).await
                })
            })
            .collect();
        for teller in tellers {
            teller.await??;
        }

        // Refused inside the actor; only the logs and the snapshot see it.
        system.ledger.debit("bob", 1_000).await?;

        match system.ledger.withdraw("alice", 1_000).await {
            Err(LedgerError::InsufficientFunds { available, .. }) => {
                warn!(available, "Withdrawal refused as expected")
            }
            other => info!(result = ?other, "Unexpected withdrawal outcome"),
        }
        let remaining = system.ledger.withdraw("alice", 30).await?;
        info!(remaining, "Withdrawal accepted");

        let snapshot = system.ledger.snapshot().await?;
        info!(
            total = snapshot.total(),
            rejected_debits = snapshot.rejected_debits,
            "Ledger snapshot"
        );
        Ok::<_, Box<dyn Error + Send + Sync>>(())
    }
    .instrument(span)
    .await?;

    // 2. Squares
    let span = tracing::info_span!("squares_demo");
    async {
        let numbers: Vec<u64> = (1..=10).collect();
        let ordered = system.square_all(numbers.clone()).await?;
        println!("squares:        {ordered:?}");

        let mut merged = system.square_fan_in(numbers).await?;
        merged.sort_unstable();
        println!("merged squares: {merged:?}");
        Ok::<_, Box<dyn Error + Send + Sync>>(())
    }
    .instrument(span)
    .await?;

    // 3. Digest
    let started = Instant::now();
    let digests = system
        .digest(&root)
        .instrument(tracing::info_span!("digest_demo"))
        .await?;
    let digested_in = started.elapsed();

    let started = Instant::now();
    for (path, digest) in &digests {
        println!("{digest}  {}", path.display());
    }
    println!(
        "Digested {} files in {:?} and printed in {:?}",
        digests.len(),
        digested_in,
        started.elapsed()
    );

    // Shutdown system gracefully
    let snapshot = system.shutdown().await?;
    info!(accounts = snapshot.balances.len(), "Application completed successfully");
    Ok(())
}
