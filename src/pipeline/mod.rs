//! Persistence pipeline: bounded queue between crawl and storage
//!
//! The crawl engine produces `PageInfo` items; a single consumer task owns
//! the page store and drains the queue at its own pace. The channel is the
//! only structure touched by both roles, so it is the sole synchronization
//! point of the run. Shutdown signals the consumer and then polls the
//! pending counter under a fixed retry budget; items still queued after the
//! budget surface as a fatal `DrainTimeout`.

use crate::config::PipelineConfig;
use crate::crawler::PageInfo;
use crate::storage::PageStore;
use crate::{Result, SitegraphError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Dequeue poll interval; keeps the consumer responsive to the stop signal
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Producer side of the pipeline, held by the crawl engine
#[derive(Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<PageInfo>,
    pending: Arc<AtomicUsize>,
    enqueue_timeout: Duration,
}

impl PipelineHandle {
    /// Enqueues a page, blocking under backpressure up to the enqueue timeout
    ///
    /// A timeout means the consumer is stuck or hopelessly slow and is fatal
    /// to the run; pages are never silently dropped here.
    pub async fn enqueue(&self, page: PageInfo) -> Result<()> {
        self.pending.fetch_add(1, Ordering::SeqCst);

        match timeout(self.enqueue_timeout, self.tx.send(page)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Err(SitegraphError::PipelineClosed)
            }
            Err(_) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Err(SitegraphError::PipelineOverflow {
                    timeout_secs: self.enqueue_timeout.as_secs(),
                })
            }
        }
    }
}

/// The pipeline itself: bounded queue plus the single consumer task
pub struct PersistencePipeline {
    tx: mpsc::Sender<PageInfo>,
    pending: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    consumer: JoinHandle<()>,
    enqueue_timeout: Duration,
    drain_attempts: u32,
    drain_interval: Duration,
}

impl PersistencePipeline {
    /// Spawns the consumer task, which takes ownership of the store
    pub fn spawn<S>(store: S, config: &PipelineConfig) -> Self
    where
        S: PageStore + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let pending = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let consumer = tokio::spawn(consume(store, rx, Arc::clone(&pending), Arc::clone(&stop)));

        Self {
            tx,
            pending,
            stop,
            consumer,
            enqueue_timeout: config.enqueue_timeout(),
            drain_attempts: config.drain_attempts,
            drain_interval: config.drain_interval(),
        }
    }

    /// Returns a clone-cheap producer handle for the crawl engine
    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            tx: self.tx.clone(),
            pending: Arc::clone(&self.pending),
            enqueue_timeout: self.enqueue_timeout,
        }
    }

    /// Number of pages enqueued but not yet written
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Signals the consumer and waits for the queue to drain
    ///
    /// Polls emptiness `drain_attempts` times at `drain_interval` spacing;
    /// exceeding the budget aborts the consumer and fails with
    /// `DrainTimeout` naming the remaining queue size.
    pub async fn shutdown(self) -> Result<()> {
        self.stop.store(true, Ordering::SeqCst);
        drop(self.tx);

        let mut attempts = 0;
        while self.pending.load(Ordering::SeqCst) > 0 {
            if attempts >= self.drain_attempts {
                let remaining = self.pending.load(Ordering::SeqCst);
                tracing::error!(remaining, "pipeline failed to drain within the budget");
                self.consumer.abort();
                return Err(SitegraphError::DrainTimeout { remaining });
            }

            tokio::time::sleep(self.drain_interval).await;
            attempts += 1;
        }

        let _ = self.consumer.await;
        tracing::debug!("persistence pipeline drained and stopped");
        Ok(())
    }
}

/// Consumer loop: dequeue with a short poll timeout, upsert, repeat
///
/// A failed upsert is logged and the page dropped; storage-level retries do
/// not belong to this layer.
async fn consume<S: PageStore>(
    mut store: S,
    mut rx: mpsc::Receiver<PageInfo>,
    pending: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
) {
    loop {
        match timeout(POLL_INTERVAL, rx.recv()).await {
            Ok(Some(page)) => {
                match store.upsert_page(&page) {
                    Ok(outcome) => {
                        tracing::debug!(url = %page.url, ?outcome, "page persisted");
                    }
                    Err(e) => {
                        tracing::warn!(url = %page.url, error = %e, "failed to persist page, dropping it");
                    }
                }
                pending.fetch_sub(1, Ordering::SeqCst);
            }
            // Channel closed and fully drained
            Ok(None) => break,
            // Idle poll; only exit once shutdown was signalled
            Err(_) => {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
            }
        }
    }
}
