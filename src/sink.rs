use crate::connection::ConnectError;
use crate::record::LogRecord;
use async_trait::async_trait;
use std::error::Error;
use std::io;

/// Asynchronous destination for [`LogRecord`]s handed over by the
/// [`Emitter`](crate::emitter::Emitter).
///
/// Implementations own the transport to the collector. They are shared by
/// every producer at once, so `send` must be safe to call concurrently and
/// must deliver each record as one uninterrupted unit.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Deliver a single log record.
    ///
    /// **Returns**
    /// - `Ok(())` once the record has been written (or queued) as a whole.
    /// - `Err(..)` if the record could not be delivered. The emitter logs
    ///   the error locally and drops the record; it never retries.
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Wait until every record accepted so far has reached the transport.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// Failures reported by the sinks in this crate.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("collector connection is closed")]
    Closed,

    #[error("failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write to collector: {0}")]
    Io(#[from] io::Error),

    #[error("reconnect to collector failed: {0}")]
    Reconnect(#[source] ConnectError),

    #[error("collector unreachable, dropping record until the reconnect cooldown passes")]
    Down,

    #[error("log queue is full, dropping record")]
    QueueFull,

    #[error("log queue writer has stopped")]
    QueueClosed,
}
