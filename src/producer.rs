use crate::emitter::Emitter;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeMap;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One simulated outcome produced by a [`Producer`] iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub message: String,
    pub labels: BTreeMap<String, String>,
    pub duration_ms: u64,
    pub status_code: u16,
}

impl Event {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            labels: BTreeMap::new(),
            duration_ms: 0,
            status_code: 0,
        }
    }

    pub fn label(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.labels.insert(key.to_string(), value.into());
        self
    }

    /// Mark the event as failed with `status_code` and attach the `error`
    /// label.
    pub fn fail(&mut self, status_code: u16, error: &str) -> &mut Self {
        self.status_code = status_code;
        self.label("error", error)
    }

    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }
}

/// A simulated domain service that fabricates one [`Event`] per call.
///
/// Any state a producer keeps between events lives in the producer itself;
/// nothing is shared with other producers.
pub trait Producer: Send {
    /// Stable `service` value stamped on every record of this producer.
    fn service(&self) -> &'static str;

    fn next_event(&mut self, rng: &mut StdRng) -> Event;
}

/// Randomized pause between two iterations of a producer loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    /// Shortest pause.
    pub min: Duration,
    /// Upper bound (exclusive) on the random extra added to `min`.
    pub jitter: Duration,
}

impl Pacing {
    pub fn sample(&self, rng: &mut StdRng) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.min;
        }
        self.min + Duration::from_millis(rng.random_range(0..jitter_ms))
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(500),
            jitter: Duration::from_millis(2000),
        }
    }
}

/// Drive `producer` until `cancel` fires: build an event, emit it, sleep.
///
/// Returns the number of events emitted. Cancellation is observed while
/// sleeping, so an in-flight emit always completes.
pub async fn run_producer<P: Producer>(
    mut producer: P,
    emitter: Emitter,
    pacing: Pacing,
    mut rng: StdRng,
    cancel: CancellationToken,
) -> u64 {
    let service = producer.service();
    info!(service, "producer started");

    let mut count = 0u64;
    loop {
        if cancel.is_cancelled() {
            break;
        }

        let event = producer.next_event(&mut rng);
        emitter.emit_event(service, event).await;
        count += 1;

        let pause = pacing.sample(&mut rng);
        debug!(service, pause_ms = pause.as_millis() as u64, "producer sleeping");
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(pause) => {}
        }
    }

    info!(service, emitted = count, "producer stopped");
    count
}
