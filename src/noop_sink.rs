use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sink that counts records and discards them.
///
/// Handy for dry runs without a collector and for measuring producer and
/// emitter overhead on their own.
#[derive(Default)]
pub struct NoopSink {
    accepted: AtomicU64,
}

impl NoopSink {
    /// Number of records received so far.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LogSink for NoopSink {
    async fn send(&self, _record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
