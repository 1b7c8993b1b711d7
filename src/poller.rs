//! Background intake poller — runs the orchestrator on a timer.
//!
//! Timer-based loop:
//! 1. `run_cycle()` lists new mailbox messages
//! 2. Each message runs through the full intake pipeline
//! 3. Failures leave messages unmarked, retried next tick

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::{DEFAULT_POLL_INTERVAL_SECS, POLL_INTERVAL_ENV};
use crate::pipeline::IntakeOrchestrator;

/// Spawn a background task that polls the mailbox and runs the intake
/// pipeline on each tick.
///
/// Pass `Settings::poll_interval_secs` as the interval; `None` falls
/// back to the same env var and default the config layer validates.
/// Returns a `JoinHandle` and shutdown flag. Setting the flag stops the
/// loop at the next tick; in-flight messages finish first.
pub fn spawn_intake_poller(
    orchestrator: Arc<IntakeOrchestrator>,
    interval_secs: Option<u64>,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let interval = resolve_interval(interval_secs);

    let handle = tokio::spawn(async move {
        info!("Intake poller started — polling every {interval}s");

        let mut tick = tokio::time::interval(Duration::from_secs(interval));

        // Run immediately on first tick
        loop {
            tick.tick().await;

            if shutdown.load(Ordering::Relaxed) {
                info!("Intake poller shutting down");
                return;
            }

            let cycle = Uuid::new_v4();
            match orchestrator.run_cycle().await {
                Ok(batch) => {
                    if batch.processed + batch.duplicates + batch.errors > 0 {
                        info!(
                            cycle = %cycle,
                            processed = batch.processed,
                            duplicates = batch.duplicates,
                            errors = batch.errors,
                            "Poll cycle complete"
                        );
                    }
                }
                Err(e) => {
                    // Listing failed; nothing was marked, retry next tick.
                    error!(cycle = %cycle, error = %e, "Poll cycle failed");
                }
            }
        }
    });

    (handle, shutdown_flag)
}

/// Explicit interval wins; otherwise the config layer's env var, then
/// its default.
fn resolve_interval(interval_secs: Option<u64>) -> u64 {
    interval_secs.unwrap_or_else(|| {
        std::env::var(POLL_INTERVAL_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
    })
}
