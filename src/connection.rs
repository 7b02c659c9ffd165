use std::future::Future;
use std::io;
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// Bounded, fixed-delay retry policy for opening the collector connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of connect attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between two consecutive attempts.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self { max_attempts, retry_delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Error returned when the collector connection could not be opened.
///
/// Every variant is terminal: the caller is expected to abort startup.
#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("collector address is not set")]
    MissingAddress,

    #[error("connect attempt bound must be at least 1")]
    NoAttempts,

    #[error("cannot connect to collector at {addr} after {attempts} attempts: {source}")]
    Exhausted {
        addr: String,
        attempts: u32,
        #[source]
        source: io::Error,
    },
}

/// Open a TCP connection to the collector at `addr` (`host:port`).
///
/// Tries up to `policy.max_attempts` times, sleeping `policy.retry_delay`
/// between failures. Returns the first stream that connects, or the last
/// connect error once the attempts are used up.
pub async fn establish(addr: &str, policy: RetryPolicy) -> Result<TcpStream, ConnectError> {
    if addr.trim().is_empty() {
        return Err(ConnectError::MissingAddress);
    }

    let stream = establish_with(addr, policy, || TcpStream::connect(addr)).await?;
    if let Err(e) = stream.set_nodelay(true) {
        warn!(addr, error = %e, "failed to set TCP_NODELAY on collector connection");
    }
    info!(addr, "connected to collector");
    Ok(stream)
}

/// Retry loop behind [`establish`], generic over how a single attempt
/// connects.
///
/// `addr` is only used for diagnostics and the final error.
pub async fn establish_with<T, F, Fut>(
    addr: &str,
    policy: RetryPolicy,
    mut connect: F,
) -> Result<T, ConnectError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    if policy.max_attempts == 0 {
        return Err(ConnectError::NoAttempts);
    }

    let mut attempt = 1;
    loop {
        match connect().await {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    addr,
                    error = %e,
                    "cannot connect to collector"
                );
                if attempt >= policy.max_attempts {
                    return Err(ConnectError::Exhausted {
                        addr: addr.to_string(),
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }

        sleep(policy.retry_delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use test_log::test;
    use tokio::time::Instant;

    fn refused() -> io::Error {
        io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")
    }

    #[test(tokio::test(start_paused = true))]
    async fn unreachable_address_uses_every_attempt() {
        let policy = RetryPolicy::new(4, Duration::from_millis(250));
        let attempts = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&attempts);
        let result: Result<(), _> = establish_with("collector:5000", policy, || {
            seen.lock().unwrap().push(Instant::now());
            async { Err(refused()) }
        })
        .await;

        match result {
            Err(ConnectError::Exhausted { attempts: n, addr, .. }) => {
                assert_eq!(n, 4);
                assert_eq!(addr, "collector:5000");
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }

        let times = attempts.lock().unwrap();
        assert_eq!(times.len(), 4);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= policy.retry_delay);
        }
    }

    #[test(tokio::test(start_paused = true))]
    async fn succeeds_on_third_attempt_and_stops() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let calls = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&calls);
        let start = Instant::now();
        let conn = establish_with("collector:5000", policy, || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(refused())
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(conn, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[test(tokio::test(start_paused = true))]
    async fn no_delay_after_final_attempt() {
        let policy = RetryPolicy::new(1, Duration::from_secs(30));
        let start = Instant::now();
        let result: Result<(), _> = establish_with("collector:5000", policy, || async { Err(refused()) }).await;
        assert!(matches!(result, Err(ConnectError::Exhausted { attempts: 1, .. })));
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[test(tokio::test)]
    async fn zero_attempts_is_rejected() {
        let result: Result<(), _> =
            establish_with("collector:5000", RetryPolicy::new(0, Duration::ZERO), || async { Err(refused()) }).await;
        assert!(matches!(result, Err(ConnectError::NoAttempts)));
    }

    #[test(tokio::test)]
    async fn missing_address_is_a_connect_failure() {
        let result = establish("", RetryPolicy::new(3, Duration::ZERO)).await;
        assert!(matches!(result, Err(ConnectError::MissingAddress)));
    }

    #[test(tokio::test)]
    async fn invalid_address_exhausts_attempts() {
        let result = establish("not-an-address", RetryPolicy::new(2, Duration::from_millis(1))).await;
        assert!(matches!(result, Err(ConnectError::Exhausted { attempts: 2, .. })));
    }

    #[test(tokio::test)]
    async fn connects_to_live_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let stream = establish(&addr, RetryPolicy::new(1, Duration::ZERO)).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap().to_string(), addr);
    }
}
