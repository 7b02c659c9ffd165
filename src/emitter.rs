use crate::producer::Event;
use crate::record::{Level, LogRecord, RecordError};
use crate::sink::LogSink;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Counters shared by every clone of an [`Emitter`].
#[derive(Debug, Default)]
pub struct EmitterStats {
    emitted: AtomicU64,
    dropped: AtomicU64,
}

impl EmitterStats {
    /// Records the sink accepted. For a [`QueuedSink`](crate::queue::QueuedSink)
    /// that means enqueued; its own `failed` counter tracks later write losses.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Records lost to a build, encode or write failure.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Fire-and-forget front end over a shared [`LogSink`].
///
/// Every `emit*` call builds a [`LogRecord`] and hands it to the sink once.
/// Failures are logged locally and counted, never returned: producers can
/// keep looping no matter how the collector behaves. Clones share the sink
/// and the counters.
#[derive(Clone)]
pub struct Emitter {
    sink: Arc<dyn LogSink>,
    stats: Arc<EmitterStats>,
}

impl Emitter {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            stats: Arc::new(EmitterStats::default()),
        }
    }

    pub fn stats(&self) -> &EmitterStats {
        &self.stats
    }

    /// Emit a full event. The level is `ERROR` when `status_code >= 400`
    /// and `INFO` otherwise.
    pub async fn emit(
        &self,
        service: &str,
        message: impl Into<String>,
        labels: BTreeMap<String, String>,
        duration_ms: u64,
        status_code: u16,
    ) {
        let record = LogRecord::new(service, message, labels, duration_ms, status_code);
        self.deliver(service, record).await;
    }

    /// Emit a bare message with an explicit level.
    pub async fn emit_level(&self, level: Level, service: &str, message: impl Into<String>) {
        let record = LogRecord::with_level(level, service, message);
        self.deliver(service, record).await;
    }

    /// Emit an event built by a producer.
    pub async fn emit_event(&self, service: &str, event: Event) {
        self.emit(
            service,
            event.message,
            event.labels,
            event.duration_ms,
            event.status_code,
        )
        .await;
    }

    /// Wait for the sink to drain. Errors are logged, not returned.
    pub async fn flush(&self) {
        if let Err(e) = self.sink.flush().await {
            warn!(error = %e, "failed to flush log sink");
        }
    }

    async fn deliver(&self, service: &str, record: Result<LogRecord, RecordError>) {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(service, error = %e, "dropping invalid log record");
                return;
            }
        };

        match self.sink.send(&record).await {
            Ok(()) => {
                self.stats.emitted.fetch_add(1, Ordering::Relaxed);
                debug!(service, level = %record.level, "log record sent");
            }
            Err(e) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(service, error = %e, "error sending log record");
            }
        }
    }
}
