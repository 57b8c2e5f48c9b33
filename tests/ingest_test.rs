mod common;

use common::{embedded_service, transfer, user};
use relgraph::client::ClientError;
use relgraph::graph::NodeLabel;
use relgraph::{bounded_parallel_map, BulkIngestor, Config, EngineError, IngestContext, IngestError};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_partial_failure_reports_every_bad_item() {
    let (client, service) = embedded_service();
    let ingestor = BulkIngestor::new(service, 3);
    let ctx = IngestContext::new();

    let users = (1..=4).map(|i| user(&format!("USR-{}", i))).collect();
    ingestor.ingest_users(&ctx, users).await.unwrap();

    let mut transactions: Vec<_> = (0..10)
        .map(|i| transfer(&format!("TX-{}", i), "USR-1", "USR-2", i + 1))
        .collect();
    transactions[2].receiver_user_id = "USR-404".to_string();
    transactions[6].sender_user_id = String::new();
    transactions[9].sender_user_id = "USR-405".to_string();

    let err = ingestor.ingest_transactions(&ctx, transactions).await.unwrap_err();
    let tasks = err.task_error().expect("item failures");
    assert_eq!(tasks.keys(), vec!["transaction TX-2", "transaction TX-6", "transaction TX-9"]);
    assert!(matches!(
        tasks.failures[0].error,
        EngineError::Store {
            source: ClientError::MissingParticipant { .. },
            ..
        }
    ));
    assert!(matches!(tasks.failures[1].error, EngineError::Validation(_)));
    assert!(err.to_string().starts_with("multiple errors: transaction TX-2: "));

    let store = client.store_read().await;
    assert_eq!(store.label_count(NodeLabel::Transaction), 7);
}

#[tokio::test]
async fn test_transactions_before_users_write_nothing() {
    let (client, service) = embedded_service();
    let ingestor = BulkIngestor::new(service.clone(), 2);
    let ctx = IngestContext::new();

    let transactions = vec![transfer("TX-1", "USR-1", "USR-2", 1)];
    let err = ingestor
        .ingest_transactions(&ctx, transactions.clone())
        .await
        .unwrap_err();
    assert_eq!(err.task_error().map(|t| t.len()), Some(1));
    assert_eq!(client.store_read().await.label_count(NodeLabel::Transaction), 0);

    ingestor
        .ingest_users(&ctx, vec![user("USR-1"), user("USR-2")])
        .await
        .unwrap();
    ingestor.ingest_transactions(&ctx, transactions).await.unwrap();
    let view = service.user_relationships("USR-1").await.unwrap();
    assert_eq!(view.transactions.len(), 1);
}

#[tokio::test]
async fn test_cancellation_wins_over_item_errors() {
    let ctx = IngestContext::new();
    let trigger = ctx.clone();
    let keys = (0..20).map(|i| format!("item {}", i)).collect();

    let result = bounded_parallel_map(&ctx, keys, 4, move |idx| {
        let trigger = trigger.clone();
        async move {
            match idx {
                0..=2 => Err(EngineError::validation("bad item")),
                3 => {
                    trigger.cancel();
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
                _ => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
            }
        }
    })
    .await;

    assert!(matches!(result, Err(IngestError::Cancelled)));
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (a, p) = (active.clone(), peak.clone());
    let keys = (0..40).map(|i| format!("item {}", i)).collect();

    bounded_parallel_map(&IngestContext::new(), keys, 3, move |_| {
        let (active, peak) = (a.clone(), p.clone());
        async move {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .await
    .unwrap();

    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(active.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_batch_succeeds() {
    let (_client, service) = embedded_service();
    let ingestor = BulkIngestor::new(service, 0);
    assert_eq!(ingestor.workers(), 4);
    ingestor.ingest_users(&IngestContext::new(), Vec::new()).await.unwrap();
}

#[test]
fn test_config_file_with_env_override() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "graph:\n  database: fraud\ningest:\n  workers: 12\nlogging:\n  format: json").unwrap();

    let mut config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.graph.database, "fraud");
    assert_eq!(config.ingest.workers, 12);
    assert_eq!(config.logging.format, "json");
    assert!(!config.graph.is_remote());

    config
        .apply_env(|key| match key {
            "INGEST_WORKERS" => Some("6".to_string()),
            "GRAPH_URI" => Some("http://graph:7474".to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(config.ingest.workers, 6);
    assert!(config.graph.is_remote());

    let missing = Config::from_file(std::path::Path::new("/nonexistent/relgraph.yaml"));
    assert!(matches!(missing, Err(relgraph::ConfigError::Io { .. })));
}
