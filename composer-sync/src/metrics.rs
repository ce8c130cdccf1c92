//! Adapter metrics.
//!
//! Emitted through the `metrics` facade; nothing is recorded unless the host
//! application installs a recorder.

use metrics::{counter, gauge};

const CHANGES_TOTAL: &str = "composer_sync_changes_total";
const WRITES_TOTAL: &str = "composer_sync_writes_total";
const WRITE_FAILURES_TOTAL: &str = "composer_sync_write_failures_total";
const PENDING_SCENES: &str = "composer_sync_pending_scenes";
const PARKED_SCENES: &str = "composer_sync_parked_scenes";

/// Record an incoming change.
///
/// # Arguments
///
/// * `outcome` - "scheduled", "coalesced" or "parked"
pub fn record_change(outcome: &str) {
    counter!(CHANGES_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// Record a successful write.
pub fn record_write() {
    counter!(WRITES_TOTAL).increment(1);
}

/// Record a failed write.
pub fn record_write_failure() {
    counter!(WRITE_FAILURES_TOTAL).increment(1);
}

/// Update the queue gauges.
#[allow(clippy::cast_precision_loss)]
pub fn set_queue_depth(pending: usize, parked: usize) {
    gauge!(PENDING_SCENES).set(pending as f64);
    gauge!(PARKED_SCENES).set(parked as f64);
}
