//! Engine metrics for monitoring and latency tracking.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Book updates consumed counter metric name.
pub const METRIC_BOOK_UPDATES: &str = "book_updates_total";
/// Evaluation skips counter metric name.
pub const METRIC_EVALUATIONS_SKIPPED: &str = "evaluations_skipped_total";
/// Admitted opportunities counter metric name.
pub const METRIC_OPPORTUNITIES_ADMITTED: &str = "opportunities_admitted_total";
/// Legs submitted counter metric name.
pub const METRIC_LEGS_SUBMITTED: &str = "legs_submitted_total";
/// Legs filled counter metric name.
pub const METRIC_LEGS_FILLED: &str = "legs_filled_total";
/// Legs failed counter metric name.
pub const METRIC_LEGS_FAILED: &str = "legs_failed_total";
/// Completed pairs counter metric name.
pub const METRIC_PAIRS_COMPLETED: &str = "pairs_completed_total";
/// Broken pairs counter metric name.
pub const METRIC_BROKEN_PAIRS: &str = "broken_pairs_total";
/// Unwind attempts counter metric name.
pub const METRIC_UNWINDS_ATTEMPTED: &str = "unwinds_attempted_total";
/// Unwind failures counter metric name.
pub const METRIC_UNWINDS_FAILED: &str = "unwinds_failed_total";
/// Evaluation latency metric name.
pub const METRIC_EVALUATION_LATENCY: &str = "evaluation_latency_ms";
/// Pair settle latency metric name.
pub const METRIC_PAIR_SETTLE_LATENCY: &str = "pair_settle_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(METRIC_BOOK_UPDATES, "Total book-update events consumed");
    describe_counter!(
        METRIC_EVALUATIONS_SKIPPED,
        "Total evaluation cycles ending in a skip condition"
    );
    describe_counter!(
        METRIC_OPPORTUNITIES_ADMITTED,
        "Total opportunities admitted to execution"
    );
    describe_counter!(METRIC_LEGS_SUBMITTED, "Total legs submitted to the gateway");
    describe_counter!(METRIC_LEGS_FILLED, "Total legs that filled");
    describe_counter!(METRIC_LEGS_FAILED, "Total legs that failed to submit");
    describe_counter!(
        METRIC_PAIRS_COMPLETED,
        "Total pairs with both legs filled"
    );
    describe_counter!(
        METRIC_BROKEN_PAIRS,
        "Total pairs where exactly one leg filled"
    );
    describe_counter!(METRIC_UNWINDS_ATTEMPTED, "Total unwind sells issued");
    describe_counter!(
        METRIC_UNWINDS_FAILED,
        "Total unwinds that left a standing imbalance"
    );

    describe_histogram!(
        METRIC_EVALUATION_LATENCY,
        "Book update to admission decision latency in milliseconds"
    );
    describe_histogram!(
        METRIC_PAIR_SETTLE_LATENCY,
        "Pair submission to joined reconciliation latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Increment the book-updates counter.
pub fn inc_book_updates() {
    counter!(METRIC_BOOK_UPDATES).increment(1);
}

/// Increment the skipped-evaluations counter, labelled by skip kind.
pub fn inc_evaluations_skipped(reason: &'static str) {
    counter!(METRIC_EVALUATIONS_SKIPPED, "reason" => reason).increment(1);
}

/// Increment the admitted-opportunities counter.
pub fn inc_opportunities_admitted() {
    counter!(METRIC_OPPORTUNITIES_ADMITTED).increment(1);
}

/// Increment the legs-submitted counter.
pub fn inc_legs_submitted() {
    counter!(METRIC_LEGS_SUBMITTED).increment(1);
}

/// Increment the legs-filled counter.
pub fn inc_legs_filled() {
    counter!(METRIC_LEGS_FILLED).increment(1);
}

/// Increment the legs-failed counter.
pub fn inc_legs_failed() {
    counter!(METRIC_LEGS_FAILED).increment(1);
}

/// Increment the completed-pairs counter.
pub fn inc_pairs_completed() {
    counter!(METRIC_PAIRS_COMPLETED).increment(1);
}

/// Increment the broken-pairs counter.
pub fn inc_broken_pairs() {
    counter!(METRIC_BROKEN_PAIRS).increment(1);
}

/// Increment the unwinds-attempted counter.
pub fn inc_unwinds_attempted() {
    counter!(METRIC_UNWINDS_ATTEMPTED).increment(1);
}

/// Increment the unwinds-failed counter.
pub fn inc_unwinds_failed() {
    counter!(METRIC_UNWINDS_FAILED).increment(1);
}

/// Record pair settle latency.
pub fn record_pair_settle_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_PAIR_SETTLE_LATENCY).record(latency_ms);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for one evaluation cycle.
pub fn timer_evaluation() -> LatencyTimer {
    LatencyTimer::new(METRIC_EVALUATION_LATENCY)
}
