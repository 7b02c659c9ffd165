use crate::connection::{establish_with, ConnectError, RetryPolicy};
use crate::record::LogRecord;
use crate::sink::{LogSink, SinkError};
use async_trait::async_trait;
use std::error::Error;
use std::io;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, info, warn};

/// State of the shared collector connection.
enum Link {
    Up(TcpStream),
    /// A reconnect failed; records are dropped until `retry_at`.
    Down { retry_at: Instant },
    Closed,
}

/// Writes newline-delimited JSON records to the shared collector connection.
///
/// The link sits behind a single async mutex held for the whole
/// write-and-flush of one line, so concurrent senders never interleave
/// bytes on the wire.
///
/// By default a failed write loses the record and the connection stays
/// broken. With [`TcpSink::with_reconnect`] a failed write reopens the
/// connection under a bounded [`RetryPolicy`] and retries the line once.
/// If that reconnect fails the sink goes down: records are dropped without
/// touching the network until the cooldown has passed, then the next send
/// makes a single connect attempt.
pub struct TcpSink {
    link: Mutex<Link>,
    addr: String,
    reconnect: Option<RetryPolicy>,
    connect_timeout: Duration,
    cooldown: Duration,
}

impl TcpSink {
    /// Wrap an already established connection to `addr`.
    pub fn new(stream: TcpStream, addr: impl Into<String>) -> Self {
        Self {
            link: Mutex::new(Link::Up(stream)),
            addr: addr.into(),
            reconnect: None,
            connect_timeout: Duration::from_secs(2),
            cooldown: Duration::from_secs(5),
        }
    }

    /// Enable reconnect-and-retry-once after a write failure.
    pub fn with_reconnect(mut self, policy: RetryPolicy) -> Self {
        self.reconnect = Some(policy);
        self
    }

    /// Bound each reconnect attempt by `connect_timeout` and stay down for
    /// `cooldown` after a failed reconnect.
    pub fn with_reconnect_timing(mut self, connect_timeout: Duration, cooldown: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.cooldown = cooldown;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Shut down the connection. Later sends fail with [`SinkError::Closed`].
    ///
    /// Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), SinkError> {
        let mut link = self.link.lock().await;
        if let Link::Up(mut stream) = std::mem::replace(&mut *link, Link::Closed) {
            stream.shutdown().await?;
            debug!(addr = %self.addr, "collector connection closed");
        }
        Ok(())
    }

    async fn write_line(&self, line: &[u8]) -> Result<(), SinkError> {
        let mut link = self.link.lock().await;

        let policy = match &mut *link {
            Link::Closed => return Err(SinkError::Closed),
            Link::Up(stream) => {
                let err = match write_all_flush(stream, line).await {
                    Ok(()) => return Ok(()),
                    Err(e) => e,
                };
                let Some(policy) = self.reconnect else {
                    return Err(err.into());
                };
                warn!(addr = %self.addr, error = %err, "write to collector failed, reconnecting");
                policy
            }
            Link::Down { retry_at } => {
                let Some(policy) = self.reconnect else {
                    return Err(SinkError::Down);
                };
                if Instant::now() < *retry_at {
                    return Err(SinkError::Down);
                }
                RetryPolicy::new(1, policy.retry_delay)
            }
        };

        match self.reconnect(policy).await {
            Ok(mut fresh) => {
                let written = write_all_flush(&mut fresh, line).await;
                *link = Link::Up(fresh);
                written.map_err(SinkError::from)
            }
            Err(e) => {
                warn!(
                    addr = %self.addr,
                    error = %e,
                    cooldown_ms = self.cooldown.as_millis() as u64,
                    "reconnect to collector failed, dropping records until cooldown passes"
                );
                *link = Link::Down {
                    retry_at: Instant::now() + self.cooldown,
                };
                Err(SinkError::Reconnect(e))
            }
        }
    }

    async fn reconnect(&self, policy: RetryPolicy) -> Result<TcpStream, ConnectError> {
        let addr = self.addr.as_str();
        let connect_timeout = self.connect_timeout;
        let stream = establish_with(addr, policy, || async move {
            match timeout(connect_timeout, TcpStream::connect(addr)).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")),
            }
        })
        .await?;
        info!(addr, "reconnected to collector");
        Ok(stream)
    }
}

async fn write_all_flush(stream: &mut TcpStream, line: &[u8]) -> io::Result<()> {
    stream.write_all(line).await?;
    stream.flush().await
}

#[async_trait]
impl LogSink for TcpSink {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        let line = record.to_line().map_err(SinkError::from)?;
        self.write_line(&line).await?;
        Ok(())
    }
}
