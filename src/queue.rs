use crate::record::LogRecord;
use crate::sink::{LogSink, SinkError};
use async_trait::async_trait;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::warn;

enum Command {
    Record(LogRecord),
    Flush(oneshot::Sender<()>),
}

/// [`LogSink`] that hands records to one dedicated writer task through a
/// bounded channel.
///
/// Producers never touch the inner sink directly: `send` only enqueues, and
/// the background task drains the queue in order. A full queue drops the
/// record instead of blocking the caller.
pub struct QueuedSink {
    sender: mpsc::Sender<Command>,
    /// Records accepted into the queue.
    pub enqueued: Arc<AtomicU64>,
    /// Records rejected because the queue was full.
    pub rejected: Arc<AtomicU64>,
    /// Records the inner sink failed to deliver.
    pub failed: Arc<AtomicU64>,
}

impl QueuedSink {
    /// Create the queue and spawn its writer task.
    ///
    /// The task exits once every handle to the returned sink is dropped and
    /// the queue has drained. A `capacity` below 1 is raised to 1.
    pub fn new(inner: Arc<dyn LogSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Command>(capacity.max(1));

        let enqueued = Arc::new(AtomicU64::new(0));
        let rejected = Arc::new(AtomicU64::new(0));
        let failed = Arc::new(AtomicU64::new(0));

        let failed_bg = Arc::clone(&failed);
        let handle = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    Command::Record(record) => {
                        if let Err(e) = inner.send(&record).await {
                            failed_bg.fetch_add(1, Ordering::Relaxed);
                            warn!(service = %record.service, error = %e, "queued log record lost");
                        }
                    }
                    Command::Flush(done) => {
                        if let Err(e) = inner.flush().await {
                            warn!(error = %e, "flushing inner log sink failed");
                        }
                        let _ = done.send(());
                    }
                }
            }
        });

        (
            Self {
                sender: tx,
                enqueued,
                rejected,
                failed,
            },
            handle,
        )
    }
}

#[async_trait]
impl LogSink for QueuedSink {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        match self.sender.try_send(Command::Record(record.clone())) {
            Ok(()) => {
                self.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::QueueFull.into())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SinkError::QueueClosed.into()),
        }
    }

    /// Resolves once everything queued before this call has been handed to
    /// the inner sink.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let (done_tx, done_rx) = oneshot::channel();
        self.sender
            .send(Command::Flush(done_tx))
            .await
            .map_err(|_| SinkError::QueueClosed)?;
        done_rx.await.map_err(|_| SinkError::QueueClosed)?;
        Ok(())
    }
}
