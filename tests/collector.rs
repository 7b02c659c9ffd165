use std::collections::BTreeMap;
use std::sync::Arc;

use log_generator::connection::{establish, RetryPolicy};
use log_generator::emitter::Emitter;
use log_generator::producer::{run_producer, Pacing};
use log_generator::queue::QueuedSink;
use log_generator::record::{Level, LogRecord};
use log_generator::services::{OrderService, PaymentService, ProductService, UserService};
use log_generator::sink::LogSink;
use log_generator::tcp_sink::TcpSink;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use test_log::test;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Stand-in collector: accepts one connection and returns every line it
/// receives once the client shuts down.
async fn collector() -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(stream).lines();
        let mut received = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            received.push(line);
        }
        received
    });
    (addr, handle)
}

async fn connect(addr: &str) -> Arc<TcpSink> {
    let stream = establish(addr, RetryPolicy::new(3, Duration::from_millis(50)))
        .await
        .unwrap();
    Arc::new(TcpSink::new(stream, addr))
}

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn concurrent_emits_arrive_as_whole_lines() {
    let (addr, received) = collector().await;
    let tcp = connect(&addr).await;
    let emitter = Emitter::new(tcp.clone());

    let mut tasks = Vec::new();
    for producer in 0..10 {
        let emitter = emitter.clone();
        tasks.push(tokio::spawn(async move {
            let service = format!("producer-{producer}");
            for seq in 0..10 {
                // Long label values make each line span several TCP segments.
                let padding = "x".repeat(4096);
                emitter
                    .emit(
                        &service,
                        format!("event {seq}"),
                        labels(&[("seq", seq.to_string().as_str()), ("padding", padding.as_str())]),
                        seq + 1,
                        if seq % 3 == 0 { 500 } else { 200 },
                    )
                    .await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    tcp.close().await.unwrap();

    let lines = received.await.unwrap();
    assert_eq!(lines.len(), 100);

    let mut per_producer: BTreeMap<String, Vec<u64>> = BTreeMap::new();
    for line in &lines {
        let record: LogRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.labels["padding"].len(), 4096);
        per_producer
            .entry(record.service.clone())
            .or_default()
            .push(record.labels["seq"].parse().unwrap());
    }

    assert_eq!(per_producer.len(), 10);
    for seqs in per_producer.values() {
        // Each producer's own events keep their order.
        assert_eq!(seqs, &(0..10).collect::<Vec<u64>>());
    }
    assert_eq!(emitter.stats().emitted(), 100);
    assert_eq!(emitter.stats().dropped(), 0);
}

#[test(tokio::test)]
async fn order_placed_scenario_on_the_wire() {
    let (addr, received) = collector().await;
    let tcp = connect(&addr).await;
    let emitter = Emitter::new(tcp.clone());

    emitter
        .emit(
            "order-service",
            "Order action: order_placed",
            labels(&[("action", "order_placed"), ("status", "pending")]),
            180,
            200,
        )
        .await;
    tcp.close().await.unwrap();

    let lines = received.await.unwrap();
    assert_eq!(lines.len(), 1);
    let value: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(value["level"], "INFO");
    assert_eq!(value["service"], "order-service");
    assert_eq!(value["labels"]["action"], "order_placed");
    assert_eq!(value["labels"]["status"], "pending");
    assert!(value["labels"].get("error").is_none());
    assert_eq!(value["status_code"], 200);
    assert!(value["@timestamp"].is_string());
}

#[test(tokio::test)]
async fn payment_failed_scenario_on_the_wire() {
    let (addr, received) = collector().await;
    let tcp = connect(&addr).await;
    let emitter = Emitter::new(tcp.clone());

    emitter
        .emit(
            "payment-service",
            "Payment action: payment_failed",
            labels(&[("action", "payment_failed"), ("error", "Insufficient funds")]),
            640,
            402,
        )
        .await;
    emitter.emit_level(Level::Info, "log-generator", "bare message").await;
    tcp.close().await.unwrap();

    let lines = received.await.unwrap();
    assert_eq!(lines.len(), 2);

    let failed: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(failed["level"], "ERROR");
    assert_eq!(failed["status_code"], 402);
    assert!(!failed["labels"]["error"].as_str().unwrap().is_empty());

    let bare: Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(bare["level"], "INFO");
    for omitted in ["labels", "duration_ms", "status_code"] {
        assert!(bare.get(omitted).is_none(), "{omitted} should be omitted");
    }
}

#[test(tokio::test)]
async fn writes_after_close_are_dropped_quietly() {
    let (addr, received) = collector().await;
    let tcp = connect(&addr).await;
    let emitter = Emitter::new(tcp.clone());

    emitter.emit_level(Level::Info, "user-service", "before close").await;
    tcp.close().await.unwrap();
    emitter.emit_level(Level::Info, "user-service", "after close").await;

    assert_eq!(received.await.unwrap().len(), 1);
    assert_eq!(emitter.stats().emitted(), 1);
    assert_eq!(emitter.stats().dropped(), 1);
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn producers_share_one_queued_connection() {
    let (addr, received) = collector().await;
    let tcp = connect(&addr).await;
    let (queue, writer) = QueuedSink::new(tcp.clone(), 1024);
    let emitter = Emitter::new(Arc::new(queue) as Arc<dyn LogSink>);

    let cancel = CancellationToken::new();
    let pacing = Pacing {
        min: Duration::from_millis(1),
        jitter: Duration::from_millis(3),
    };
    let tasks = vec![
        tokio::spawn(run_producer(UserService::new(), emitter.clone(), pacing, StdRng::seed_from_u64(1), cancel.clone())),
        tokio::spawn(run_producer(OrderService, emitter.clone(), pacing, StdRng::seed_from_u64(2), cancel.clone())),
        tokio::spawn(run_producer(PaymentService, emitter.clone(), pacing, StdRng::seed_from_u64(3), cancel.clone())),
        tokio::spawn(run_producer(ProductService, emitter.clone(), pacing, StdRng::seed_from_u64(4), cancel.clone())),
    ];

    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();
    let mut produced = 0;
    for task in tasks {
        produced += task.await.unwrap();
    }

    emitter.flush().await;
    let delivered = emitter.stats().emitted();
    drop(emitter);
    writer.await.unwrap();
    tcp.close().await.unwrap();

    let lines = received.await.unwrap();
    assert!(produced > 0);
    assert_eq!(delivered, produced);
    assert_eq!(lines.len() as u64, produced);

    let mut services = std::collections::BTreeSet::new();
    for line in &lines {
        let record: LogRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.level, Level::from_status(record.status_code));
        services.insert(record.service);
    }
    assert_eq!(
        services.into_iter().collect::<Vec<_>>(),
        vec!["order-service", "payment-service", "product-service", "user-service"]
    );
}
