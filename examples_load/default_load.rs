use std::sync::Arc;
use std::time::Instant;

use log_generator::emitter::Emitter;
use log_generator::init::init_diagnostics;
use log_generator::noop_sink::NoopSink;
use log_generator::producer::Producer;
use log_generator::services::OrderService;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Measures producer + emitter overhead with no network I/O.
#[tokio::main]
async fn main() {
    let _ = init_diagnostics();

    let sink = Arc::new(NoopSink::default());
    let emitter = Emitter::new(sink.clone());
    let mut producer = OrderService;
    let mut rng = StdRng::seed_from_u64(1);

    let n: u64 = 100_000;
    let start = Instant::now();

    for _ in 0..n {
        let event = producer.next_event(&mut rng);
        emitter.emit_event(producer.service(), event).await;
    }

    let elapsed = start.elapsed();
    println!("default config: emitted {} events in {:?} (~{:.0} ev/s, {} accepted)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        sink.accepted()
    );
}
