//! Bulk ingestion
//!
//! A fixed pool of worker tasks pulls item indices from a shared counter and
//! runs one upsert per item. Item failures are collected and reported
//! together; a cancellation or deadline stops dispatch and is reported
//! alone.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult, IngestError, TaskError};
use crate::model::{TransactionInput, UserInput};
use crate::service::RelationshipService;

/// Worker count used when zero is requested
pub const DEFAULT_WORKERS: usize = 4;

/// Cancellation handle shared by every worker of a bulk run
#[derive(Clone)]
pub struct IngestContext {
    cancel: Arc<watch::Sender<bool>>,
    deadline: Option<Instant>,
}

impl IngestContext {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            cancel: Arc::new(cancel),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Signal every holder of this context to stop
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// `Err` with the stop signal once cancelled or past the deadline
    pub fn check(&self) -> EngineResult<()> {
        if self.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(EngineError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolves with the stop signal when the context is cancelled or expires
    pub async fn done(&self) -> EngineError {
        let mut rx = self.cancel.subscribe();
        let cancelled = async move {
            while !*rx.borrow_and_update() {
                if rx.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        };
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = cancelled => EngineError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => EngineError::DeadlineExceeded,
            },
            None => {
                cancelled.await;
                EngineError::Cancelled
            }
        }
    }
}

impl Default for IngestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `op` for every index in `0..keys.len()` on `workers` concurrent tasks.
///
/// `keys[i]` names item `i` in the aggregated error. Failures are reported
/// in item order. A stop signal observed by any worker wins over item errors.
pub async fn bounded_parallel_map<F, Fut>(
    ctx: &IngestContext,
    keys: Vec<String>,
    workers: usize,
    op: F,
) -> Result<(), IngestError>
where
    F: Fn(usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = EngineResult<()>> + Send + 'static,
{
    let total = keys.len();
    if total == 0 {
        return Ok(());
    }
    let workers = if workers == 0 { DEFAULT_WORKERS } else { workers };
    let workers = workers.min(total);

    let op = Arc::new(op);
    let next = Arc::new(AtomicUsize::new(0));
    let (err_tx, mut err_rx) = mpsc::channel::<(usize, EngineError)>(total);

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let ctx = ctx.clone();
        let op = op.clone();
        let next = next.clone();
        let err_tx = err_tx.clone();
        handles.push(tokio::spawn(async move {
            loop {
                if let Err(signal) = ctx.check() {
                    return Err(signal);
                }
                let idx = next.fetch_add(1, Ordering::SeqCst);
                if idx >= total {
                    return Ok(());
                }
                let item = (*op)(idx);
                let outcome = tokio::select! {
                    biased;
                    signal = ctx.done() => Err(signal),
                    result = item => result,
                };
                match outcome {
                    Ok(()) => {}
                    Err(e) if e.is_cancellation() => return Err(e),
                    Err(e) => {
                        // Sized to the batch, never blocks
                        let _ = err_tx.send((idx, e)).await;
                    }
                }
            }
        }));
    }
    drop(err_tx);

    let mut stop: Option<EngineError> = None;
    let mut crashed = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(signal)) => {
                stop.get_or_insert(signal);
            }
            Err(join_err) => {
                warn!(error = %join_err, "ingest worker failed");
                crashed.push(EngineError::Worker(join_err.to_string()));
            }
        }
    }

    match stop {
        Some(EngineError::DeadlineExceeded) => return Err(IngestError::DeadlineExceeded),
        Some(_) => return Err(IngestError::Cancelled),
        None => {}
    }

    let mut collected = Vec::new();
    while let Some(entry) = err_rx.recv().await {
        collected.push(entry);
    }
    collected.sort_by_key(|(idx, _)| *idx);

    let mut failures = TaskError::default();
    for (idx, error) in collected {
        debug!(key = %keys[idx], error = %error, "item failed");
        failures.push(keys[idx].clone(), error);
    }
    for error in crashed {
        failures.push("worker", error);
    }
    failures.into_result().map_err(IngestError::from)
}

/// Drives batches of users and transactions through the service
pub struct BulkIngestor {
    service: Arc<RelationshipService>,
    workers: usize,
}

impl BulkIngestor {
    pub fn new(service: Arc<RelationshipService>, workers: usize) -> Self {
        let workers = if workers == 0 { DEFAULT_WORKERS } else { workers };
        Self { service, workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Upsert every user. Run to completion before ingesting transactions
    /// that reference these users.
    pub async fn ingest_users(&self, ctx: &IngestContext, users: Vec<UserInput>) -> Result<(), IngestError> {
        let keys = users
            .iter()
            .enumerate()
            .map(|(i, u)| item_key("user", &u.id, i))
            .collect();
        let users = Arc::new(users);
        let service = self.service.clone();
        self.run(ctx, "users", keys, move |idx| {
            let service = service.clone();
            let users = users.clone();
            async move { service.upsert_user(&users[idx]).await }
        })
        .await
    }

    pub async fn ingest_transactions(
        &self,
        ctx: &IngestContext,
        transactions: Vec<TransactionInput>,
    ) -> Result<(), IngestError> {
        let keys = transactions
            .iter()
            .enumerate()
            .map(|(i, t)| item_key("transaction", &t.id, i))
            .collect();
        let transactions = Arc::new(transactions);
        let service = self.service.clone();
        self.run(ctx, "transactions", keys, move |idx| {
            let service = service.clone();
            let transactions = transactions.clone();
            async move { service.upsert_transaction(&transactions[idx]).await }
        })
        .await
    }

    async fn run<F, Fut>(&self, ctx: &IngestContext, batch: &str, keys: Vec<String>, op: F) -> Result<(), IngestError>
    where
        F: Fn(usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EngineResult<()>> + Send + 'static,
    {
        let count = keys.len();
        let start = std::time::Instant::now();
        info!(batch, count, workers = self.workers, "ingestion started");

        let result = bounded_parallel_map(ctx, keys, self.workers, op).await;

        let failures = result
            .as_ref()
            .err()
            .and_then(|e| e.task_error())
            .map(|t| t.len())
            .unwrap_or(0);
        match &result {
            Err(IngestError::Cancelled) | Err(IngestError::DeadlineExceeded) => {
                warn!(batch, elapsed_ms = start.elapsed().as_millis() as u64, "ingestion stopped early");
            }
            _ => {
                info!(
                    batch,
                    count,
                    failures,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "ingestion finished"
                );
            }
        }
        result
    }
}

/// Business key of an item, or its position when the key is missing
fn item_key(kind: &str, id: &str, index: usize) -> String {
    if id.is_empty() {
        format!("{} #{}", kind, index)
    } else {
        format!("{} {}", kind, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item {}", i)).collect()
    }

    #[tokio::test]
    async fn test_all_items_run() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let result = bounded_parallel_map(&IngestContext::new(), keys(25), 4, move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(seen.load(Ordering::SeqCst), 25);
    }

    #[tokio::test]
    async fn test_failures_are_aggregated_in_order() {
        let result = bounded_parallel_map(&IngestContext::new(), keys(10), 3, |idx| async move {
            if idx % 4 == 1 {
                Err(EngineError::validation(format!("bad {}", idx)))
            } else {
                Ok(())
            }
        })
        .await;
        let err = result.unwrap_err();
        let tasks = err.task_error().unwrap();
        assert_eq!(tasks.keys(), vec!["item 1", "item 5", "item 9"]);
        assert!(err.to_string().starts_with("multiple errors: item 1: validation error: bad 1; "));
    }

    #[tokio::test]
    async fn test_cancelled_context_dispatches_nothing() {
        let ctx = IngestContext::new();
        ctx.cancel();
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        let result = bounded_parallel_map(&ctx, keys(5), 2, move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(EngineError::validation("never"))
            }
        })
        .await;
        assert!(matches!(result, Err(IngestError::Cancelled)));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deadline_stops_slow_batch() {
        let ctx = IngestContext::new().with_timeout(Duration::from_millis(20));
        let result = bounded_parallel_map(&ctx, keys(8), 2, |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(IngestError::DeadlineExceeded)));
    }

    #[test]
    fn test_item_key() {
        assert_eq!(item_key("user", "USR-1", 3), "user USR-1");
        assert_eq!(item_key("user", "", 3), "user #3");
    }
}
