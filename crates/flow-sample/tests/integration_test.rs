use flow_framework::{ActorError, FailurePolicy};
use flow_sample::config::AppConfig;
use flow_sample::ledger_actor::LedgerError;
use flow_sample::lifecycle::FlowSystem;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

/// Full end-to-end test with the real ledger actor and real pipelines.
#[tokio::test]
async fn test_full_flow_system_integration() {
    let system = FlowSystem::new(AppConfig::default());

    // Credits and debits are fire-and-forget
    system.ledger.credit("alice", 100).await.unwrap();
    system.ledger.credit("bob", 20).await.unwrap();
    system.ledger.debit("alice", 30).await.unwrap();

    // A request sees every event sent before it
    assert_eq!(system.ledger.balance("alice").await.unwrap(), 70);

    // Overdraft debit: refused inside the actor, counted in the snapshot
    system.ledger.debit("bob", 21).await.unwrap();
    let snapshot = system.ledger.snapshot().await.unwrap();
    assert_eq!(snapshot.rejected_debits, 1);
    assert_eq!(snapshot.total(), 90);

    // Withdrawals report failure to the caller
    let result = system.ledger.withdraw("bob", 21).await;
    assert!(
        matches!(result, Err(LedgerError::InsufficientFunds { available: 20, .. })),
        "Should fail when funds are insufficient: {result:?}"
    );
    assert_eq!(system.ledger.withdraw("bob", 20).await.unwrap(), 0);

    // Pipelines share the system's configuration
    assert_eq!(
        system.square_all(vec![1, 2, 3]).await.unwrap(),
        vec![1, 4, 9]
    );
    let mut merged = system.square_fan_in(vec![2, 3, 4, 5]).await.unwrap();
    merged.sort_unstable();
    assert_eq!(merged, vec![4, 9, 16, 25]);

    // Graceful shutdown returns the final balances
    let final_snapshot = system.shutdown().await.expect("Failed to shutdown system");
    assert_eq!(final_snapshot.total(), 70);
    assert_eq!(final_snapshot.rejected_debits, 1);
}

/// Concurrent withdrawals against one account: the actor serializes them, so
/// exactly as many succeed as the balance allows.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals() {
    let system = FlowSystem::new(AppConfig::default());
    system.ledger.credit("shared", 20).await.unwrap();

    let mut handles = vec![];
    for _ in 0..15 {
        let ledger = system.ledger.clone();
        handles.push(tokio::spawn(async move { ledger.withdraw("shared", 2).await }));
    }

    let mut successful = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successful += 1,
            Err(LedgerError::InsufficientFunds { .. }) => refused += 1,
            Err(e) => panic!("Unexpected error: {e}"),
        }
    }

    assert_eq!(successful, 10, "20 / 2 withdrawals fit");
    assert_eq!(refused, 5);
    assert_eq!(system.ledger.balance("shared").await.unwrap(), 0);

    system.shutdown().await.unwrap();
}

/// Events queued before shutdown are still applied; clients used afterwards
/// get a transport error.
#[tokio::test]
async fn test_shutdown_drains_then_refuses() {
    let system = FlowSystem::new(AppConfig::default());
    let late_client = system.ledger.clone();

    for _ in 0..10 {
        system.ledger.credit("carol", 1).await.unwrap();
    }
    let snapshot = system.shutdown().await.unwrap();
    assert_eq!(snapshot.total(), 10);

    assert!(matches!(
        late_client.credit("carol", 1).await,
        Err(LedgerError::Actor(ActorError::MailboxClosed))
    ));
    assert!(matches!(
        late_client.balance("carol").await,
        Err(LedgerError::Actor(ActorError::ActorStopped))
    ));
}

#[tokio::test]
async fn test_digest_through_system() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("one"), "1").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/two"), "2").unwrap();

    let mut config = AppConfig::default();
    config.digest_workers = 2;
    config.pipeline.channel_capacity = 1;
    let system = FlowSystem::new(config);

    let digests = system.digest(dir.path()).await.unwrap();
    assert_eq!(digests.len(), 2);
    assert!(digests.keys().all(|path| path.starts_with(dir.path())));
    assert!(digests.values().all(|digest| digest.len() == 64));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_config_is_applied() {
    let config = AppConfig::from_lookup(|key| match key {
        "FLOW_MAILBOX_CAPACITY" => Some("3".to_string()),
        "FLOW_REQUEST_TIMEOUT_MS" => Some("500".to_string()),
        "FLOW_FAIL_FAST" => Some("true".to_string()),
        _ => None,
    })
    .unwrap();
    let system = FlowSystem::new(config);

    assert_eq!(system.config().ledger.mailbox_capacity, 3);
    assert_eq!(
        system.config().ledger.request_timeout,
        Some(Duration::from_millis(500))
    );
    assert_eq!(system.config().pipeline.failure_policy, FailurePolicy::FailFast);

    system.ledger.credit("dave", 5).await.unwrap();
    assert_eq!(system.ledger.balance("dave").await.unwrap(), 5);
    system.shutdown().await.unwrap();
}
