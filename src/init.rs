use crate::env::{env_or, RUST_LOG_ENV};
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Settings for the generator's own diagnostics.
///
/// These never travel over the collector connection; they go to stderr.
///
/// **Fields**
/// - `filter`: `EnvFilter` directives, e.g. `info` or `log_generator=debug`.
/// - `with_target`: print the module target of each diagnostic line.
#[derive(Clone, Debug)]
pub struct DiagnosticsConfig {
    pub filter: String,
    pub with_target: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            filter: env_or(RUST_LOG_ENV, "info"),
            with_target: false,
        }
    }
}

/// Install the global `tracing` subscriber used for local diagnostics.
///
/// Invalid filter directives fall back to `info`. Fails if a global
/// subscriber is already set.
pub fn init_diagnostics_with_config(config: DiagnosticsConfig) -> Result<(), SetGlobalDefaultError> {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.with_target);

    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
}

/// Install diagnostics with [`DiagnosticsConfig::default`], which honours
/// `RUST_LOG`.
pub fn init_diagnostics() -> Result<(), SetGlobalDefaultError> {
    init_diagnostics_with_config(DiagnosticsConfig::default())
}
