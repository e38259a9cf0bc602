//! Claims Verifier Node Binary
//!
//! Reads claim events as newline-delimited JSON on stdin, fetches each
//! claim's payload from a local directory and logs a decision for it.
//!
//! # Usage
//!
//! ```bash
//! # Validate events piped from a ledger listener
//! ledger-tail | cargo run --bin verifier-node
//!
//! # Run with environment variables
//! VERIFIER_PAYLOAD_DIR=/var/claims VERIFIER_MAX_IN_FLIGHT=64 cargo run --bin verifier-node
//! ```
//!
//! # Environment Variables
//!
//! * `VERIFIER_VERIFIER_ID` - Verifier identity (default: generated)
//! * `VERIFIER_MAX_IN_FLIGHT` - Concurrent claim validations (default: 32)
//! * `VERIFIER_EVENT_BUFFER` - Event channel capacity (default: 100)
//! * `VERIFIER_FETCH_TIMEOUT_MS` - Deadline for one payload fetch (default: 30000)
//! * `VERIFIER_PAYLOAD_DIR` - Directory holding `<reference>.json` payloads (default: ./payloads)
//! * `VERIFIER_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `VERIFIER_LOG_FORMAT` - `pretty` or `json` (default: pretty)

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use core_kernel::HealthCheckable;
use domain_claims::ValidationEngine;
use verifier_node::adapters::{
    ChannelEventPublisher, ChannelEventSource, FileClaimStore, LoggingDecisionSink,
};
use verifier_node::{telemetry, ClaimEvent, EventProcessor, LoopExit, VerifierConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = VerifierConfig::from_env().context("loading verifier configuration")?;
    telemetry::init_tracing(&config.log_level, config.log_format)?;

    tracing::info!(
        verifier_id = %config.verifier_id,
        payload_dir = %config.payload_dir.display(),
        max_in_flight = config.max_in_flight,
        event_buffer = config.event_buffer,
        fetch_timeout_ms = config.fetch_timeout_ms,
        "Starting claims verifier node"
    );

    let storage = Arc::new(FileClaimStore::new(&config.payload_dir));
    let health = storage.health_check().await;
    if !health.is_operational() {
        tracing::warn!(
            adapter = %health.adapter_id,
            message = ?health.message,
            "Claim store is not healthy"
        );
    }

    let (source, publisher) = ChannelEventSource::new(config.event_buffer);
    let processor = Arc::new(EventProcessor::new(
        Arc::new(ValidationEngine::standard()),
        storage,
        Arc::new(source),
        Arc::new(LoggingDecisionSink),
        config.processor(),
    ));

    let cancel = CancellationToken::new();
    let mut consumer = processor.start(cancel.clone()).await?;
    let reader = tokio::spawn(forward_stdin(publisher, cancel.clone()));

    let exit = tokio::select! {
        _ = shutdown_signal() => {
            cancel.cancel();
            (&mut consumer).await
        }
        exit = &mut consumer => exit,
    }
    .context("consumption loop panicked")?;
    reader.abort();

    if exit == LoopExit::SourceClosed {
        // Input exhausted: let the remaining events finish.
        processor.wait_idle().await;
    }

    tracing::info!(?exit, "Verifier node shutdown complete");
    Ok(())
}

/// Publishes each stdin line as a claim event until EOF or cancellation
///
/// Dropping the publisher at EOF closes the event source.
async fn forward_stdin(publisher: ChannelEventPublisher, cancel: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => return,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read event input");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ClaimEvent>(&line) {
            Ok(event) => {
                if let Err(e) = publisher.publish(event).await {
                    tracing::warn!(error = %e, "Event dropped, subscriber gone");
                    return;
                }
            }
            Err(e) => tracing::warn!(error = %e, "Skipping malformed claim event"),
        }
    }

    tracing::info!("Event input exhausted");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
