//! Duration math for closing runs and stoppages.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Aggregates written onto a run when it is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunMetrics {
    pub total_seconds: i64,
    /// `None` unless a positive cycle count was recorded.
    pub average_cycle_seconds: Option<f64>,
}

/// Whole seconds between `start` and `end`.
///
/// Fails with `Validation` if `end` precedes `start` (e.g. the clock was
/// moved backwards); the caller must not apply the transition.
pub fn elapsed_seconds(start: Timestamp, end: Timestamp) -> Result<i64, CoreError> {
    let secs = (end - start).num_seconds();
    if secs < 0 {
        return Err(CoreError::Validation(format!(
            "End instant {end} precedes start instant {start}"
        )));
    }
    Ok(secs)
}

pub fn average_cycle_seconds(total_seconds: i64, cycles: Option<i32>) -> Option<f64> {
    match cycles {
        Some(n) if n > 0 => Some(total_seconds as f64 / f64::from(n)),
        _ => None,
    }
}

pub fn run_metrics(
    start: Timestamp,
    end: Timestamp,
    cycles: Option<i32>,
) -> Result<RunMetrics, CoreError> {
    let total_seconds = elapsed_seconds(start, end)?;
    Ok(RunMetrics {
        total_seconds,
        average_cycle_seconds: average_cycle_seconds(total_seconds, cycles),
    })
}
