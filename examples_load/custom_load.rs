use std::sync::Arc;
use std::time::Instant;

use log_generator::emitter::Emitter;
use log_generator::noop_sink::NoopSink;
use log_generator::queue::QueuedSink;
use log_generator::record::Level;

/// Pushes records from many tasks through the single-writer queue and
/// reports how many were rejected because the queue was full.
#[tokio::main]
async fn main() {
    let inner = Arc::new(NoopSink::default());
    let (queue, writer) = QueuedSink::new(inner.clone(), 50_000);
    let rejected = Arc::clone(&queue.rejected);
    let emitter = Emitter::new(Arc::new(queue));

    let tasks: u64 = 16;
    let per_task: u64 = 10_000;
    let start = Instant::now();

    let mut handles = Vec::new();
    for t in 0..tasks {
        let emitter = emitter.clone();
        handles.push(tokio::spawn(async move {
            let service = format!("load-{t}");
            for i in 0..per_task {
                emitter.emit_level(Level::Info, &service, format!("custom load event {i}")).await;
            }
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }
    emitter.flush().await;

    let elapsed = start.elapsed();
    let n = tasks * per_task;
    println!("queued config: emitted {} events in {:?} (~{:.0} ev/s), {} rejected, {} written",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        rejected.load(std::sync::atomic::Ordering::Relaxed),
        inner.accepted()
    );

    drop(emitter);
    let _ = writer.await;
}
