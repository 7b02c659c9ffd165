use crate::config::{ConfigError, GeneratorConfig};
use crate::connection::{establish, ConnectError};
use crate::emitter::Emitter;
use crate::producer::{run_producer, Pacing, Producer};
use crate::queue::QueuedSink;
use crate::record::Level;
use crate::services::{OrderService, PaymentService, ProductService, UserService};
use crate::sink::LogSink;
use crate::tcp_sink::TcpSink;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// `service` value of the generator's own lifecycle records.
pub const SERVICE: &str = "log-generator";

/// Failures that stop the generator before any producer runs.
///
/// The binary exits with a non-zero status on any of these.
#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Delivery totals reported when the generator shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records the sink accepted. In queued mode that means enqueued.
    pub accepted: u64,
    /// Records dropped before the sink accepted them.
    pub dropped: u64,
    /// Queued records the writer task failed to write.
    pub lost_in_queue: u64,
}

impl RunSummary {
    /// Records that were actually written to the collector connection.
    pub fn delivered(&self) -> u64 {
        self.accepted.saturating_sub(self.lost_in_queue)
    }
}

fn spawn_producer<P>(
    set: &mut JoinSet<u64>,
    producer: P,
    emitter: &Emitter,
    pacing: Pacing,
    cancel: &CancellationToken,
) where
    P: Producer + 'static,
{
    set.spawn(run_producer(
        producer,
        emitter.clone(),
        pacing,
        StdRng::from_os_rng(),
        cancel.clone(),
    ));
}

/// Connect to the collector, run every producer until `shutdown` resolves,
/// then drain and close the connection.
///
/// Only startup can fail. Once connected, delivery problems are logged and
/// counted in the returned [`RunSummary`].
pub async fn run<F>(config: GeneratorConfig, pacing: Pacing, shutdown: F) -> Result<RunSummary, StartupError>
where
    F: Future<Output = ()>,
{
    let stream = establish(&config.collector_addr, config.connect).await?;

    let mut tcp = TcpSink::new(stream, config.collector_addr.clone());
    if let Some(policy) = config.reconnect {
        tcp = tcp.with_reconnect(policy);
    }
    let tcp = Arc::new(tcp);

    let (sink, writer, queue_failed) = match config.queue_capacity {
        Some(capacity) => {
            let (queue, handle) = QueuedSink::new(tcp.clone(), capacity);
            info!(capacity, "writing through single-writer queue");
            let failed = Arc::clone(&queue.failed);
            (Arc::new(queue) as Arc<dyn LogSink>, Some(handle), Some(failed))
        }
        None => (tcp.clone() as Arc<dyn LogSink>, None, None),
    };

    let emitter = Emitter::new(sink);
    emitter.emit_level(Level::Info, SERVICE, "log generator started").await;

    let cancel = CancellationToken::new();
    let mut producers = JoinSet::new();
    spawn_producer(&mut producers, UserService::new(), &emitter, pacing, &cancel);
    spawn_producer(&mut producers, OrderService, &emitter, pacing, &cancel);
    spawn_producer(&mut producers, PaymentService, &emitter, pacing, &cancel);
    spawn_producer(&mut producers, ProductService, &emitter, pacing, &cancel);

    shutdown.await;
    info!("shutdown requested");

    cancel.cancel();
    while let Some(joined) = producers.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "producer task failed");
        }
    }

    emitter.emit_level(Level::Info, SERVICE, "log generator stopped").await;
    emitter.flush().await;

    let mut summary = RunSummary {
        accepted: emitter.stats().emitted(),
        dropped: emitter.stats().dropped(),
        lost_in_queue: 0,
    };
    drop(emitter);
    if let Some(writer) = writer {
        if let Err(e) = writer.await {
            warn!(error = %e, "queue writer task failed");
        }
    }
    if let Some(failed) = queue_failed {
        summary.lost_in_queue = failed.load(Ordering::Relaxed);
    }

    if let Err(e) = tcp.close().await {
        warn!(error = %e, "failed to close collector connection");
    }
    Ok(summary)
}
