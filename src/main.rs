use std::process::ExitCode;

use log_generator::app::run;
use log_generator::config::GeneratorConfig;
use log_generator::init::init_diagnostics;
use log_generator::producer::Pacing;
use tracing::{error, info};

/// Resolves on Ctrl-C. If the handler cannot be installed there is no way
/// to stop cleanly, so it never resolves and the process runs until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_diagnostics() {
        eprintln!("failed to install diagnostics subscriber: {e}");
        return ExitCode::FAILURE;
    }

    let result = match GeneratorConfig::from_env() {
        Ok(config) => run(config, Pacing::default(), shutdown_signal()).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(summary) => {
            info!(
                accepted = summary.accepted,
                delivered = summary.delivered(),
                dropped = summary.dropped,
                lost_in_queue = summary.lost_in_queue,
                "log generator exited"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "log generator failed to start, giving up");
            ExitCode::FAILURE
        }
    }
}
