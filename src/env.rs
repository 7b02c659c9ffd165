//! Environment variable names read by the generator at startup.

/// Collector address in `host:port` form. Required.
pub const LOGSTASH_HOST_ENV: &str = "LOGSTASH_HOST";

/// Reconnect attempts after a failed write. `0` or unset disables reconnecting.
pub const LOGSTASH_RECONNECT_ATTEMPTS_ENV: &str = "LOGSTASH_RECONNECT_ATTEMPTS";

/// When set, records go through a bounded queue of this capacity drained by
/// a single writer task.
pub const LOGSTASH_QUEUE_CAPACITY_ENV: &str = "LOGSTASH_QUEUE_CAPACITY";

/// Filter directives for local diagnostics, e.g. `info` or `log_generator=debug`.
pub const RUST_LOG_ENV: &str = "RUST_LOG";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
