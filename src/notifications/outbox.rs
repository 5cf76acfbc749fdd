//! In-process email outbox.
//!
//! Requests enqueue messages on a bounded channel and return immediately. A
//! background task hands each message to its own delivery task, which retries
//! with exponential backoff. Shutdown stops intake and waits for in-flight
//! deliveries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

use super::{EmailMessage, Mailer};
use crate::config::OutboxConfig;

/// Counters reported when the outbox stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutboxStats {
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> OutboxStats {
        OutboxStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
struct Job {
    kind: &'static str,
    message: EmailMessage,
}

/// Cheap to clone; held by request handlers.
#[derive(Clone, Debug)]
pub struct OutboxHandle {
    tx: mpsc::Sender<Job>,
    counters: Arc<Counters>,
}

impl OutboxHandle {
    /// Queues a message without waiting. Returns `false` when the queue is
    /// full or closed; the message is counted as dropped.
    pub fn enqueue(&self, kind: &'static str, message: EmailMessage) -> bool {
        let to = message.to.clone();
        match self.tx.try_send(Job { kind, message }) {
            Ok(()) => true,
            Err(e) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                let reason = match e {
                    mpsc::error::TrySendError::Full(_) => "queue full",
                    mpsc::error::TrySendError::Closed(_) => "outbox stopped",
                };
                tracing::error!(kind, %to, reason, "email dropped");
                false
            }
        }
    }

    pub fn stats(&self) -> OutboxStats {
        self.counters.snapshot()
    }
}

pub struct Outbox {
    handle: OutboxHandle,
    stop_tx: oneshot::Sender<()>,
    worker: JoinHandle<()>,
}

impl Outbox {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(mailer: Arc<dyn Mailer>, config: &OutboxConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let (stop_tx, stop_rx) = oneshot::channel();
        let counters = Arc::new(Counters::default());
        let retry = Retry { max_attempts: config.max_attempts.max(1), initial_backoff: config.initial_backoff };
        let worker = tokio::spawn(run(rx, stop_rx, mailer, retry, counters.clone()));
        Self { handle: OutboxHandle { tx, counters }, stop_tx, worker }
    }

    pub fn handle(&self) -> OutboxHandle {
        self.handle.clone()
    }

    /// Stops accepting messages, finishes everything already queued and
    /// returns the final counters.
    pub async fn shutdown(self) -> OutboxStats {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.worker.await {
            tracing::error!(error = %e, "outbox worker panicked");
        }
        let stats = self.handle.stats();
        tracing::info!(delivered = stats.delivered, failed = stats.failed, dropped = stats.dropped, "outbox stopped");
        stats
    }
}

#[derive(Clone, Copy, Debug)]
struct Retry {
    max_attempts: u32,
    initial_backoff: Duration,
}

async fn run(
    mut rx: mpsc::Receiver<Job>,
    mut stop_rx: oneshot::Receiver<()>,
    mailer: Arc<dyn Mailer>,
    retry: Retry,
    counters: Arc<Counters>,
) {
    let mut tasks = JoinSet::new();
    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            job = rx.recv() => match job {
                Some(job) => { tasks.spawn(deliver(job, mailer.clone(), retry, counters.clone())); }
                None => break,
            },
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    rx.close();
    while let Some(job) = rx.recv().await {
        tasks.spawn(deliver(job, mailer.clone(), retry, counters.clone()));
    }
    while tasks.join_next().await.is_some() {}
}

async fn deliver(job: Job, mailer: Arc<dyn Mailer>, retry: Retry, counters: Arc<Counters>) {
    let mut backoff = retry.initial_backoff;
    for attempt in 1..=retry.max_attempts {
        match mailer.send(&job.message).await {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                tracing::info!(kind = job.kind, to = %job.message.to, attempt, "email sent");
                return;
            }
            Err(e) if attempt < retry.max_attempts => {
                tracing::warn!(kind = job.kind, to = %job.message.to, attempt, error = %e, "email failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(kind = job.kind, to = %job.message.to, attempts = attempt, error = %e, "email undeliverable");
            }
        }
    }
}
