use crate::pipeline::Pipeline;
use crate::types::CycleOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, info_span, warn, Instrument};

/// Drives the poll schedule: one cycle immediately at startup, then one per
/// interval. The cycle future is awaited inside the tick arm and missed
/// ticks are delayed, so two cycles never run concurrently.
pub async fn run_poll_loop(
    pipeline: Arc<Pipeline>,
    poll_interval: Duration,
    cycle_timeout: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        run_cycle_once(&pipeline, cycle_timeout).await;
    }
}

/// Runs one cycle under a wall-clock bound and logs the outcome. Failures
/// are not retried; recovery is the next scheduled cycle.
pub async fn run_cycle_once(pipeline: &Pipeline, cycle_timeout: Duration) {
    let cycle = pipeline.run_cycle().instrument(info_span!("poll_cycle"));

    match tokio::time::timeout(cycle_timeout, cycle).await {
        Ok(Ok(CycleOutcome::Inserted(reading))) => {
            info!(last_update = %reading.last_update, total = reading.total, "new reading stored");
        }
        Ok(Ok(CycleOutcome::Duplicate(reading))) => {
            info!(last_update = %reading.last_update, "reading already stored, skipping");
        }
        Ok(Err(e)) => error!("poll cycle failed: {}", e),
        Err(_) => warn!(
            timeout_secs = cycle_timeout.as_secs(),
            "poll cycle timed out"
        ),
    }
}
