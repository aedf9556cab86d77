//! Prometheus metrics for the classification service.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

pub const CLASSIFY_REQUESTS: &str = "classify_requests_total";
pub const COLUMNS_REQUESTS: &str = "columns_requests_total";
pub const CLASSIFY_DURATION: &str = "classify_duration_seconds";

/// Outcome label for successful requests.
pub const OUTCOME_OK: &str = "ok";

/// Register descriptions with the installed recorder.
pub fn describe() {
    describe_counter!(CLASSIFY_REQUESTS, "Classification requests by outcome");
    describe_counter!(COLUMNS_REQUESTS, "Column listing requests by outcome");
    describe_histogram!(
        CLASSIFY_DURATION,
        Unit::Seconds,
        "Time spent answering a classification request"
    );
}

pub fn record_classify(outcome: &'static str, elapsed: Duration) {
    counter!(CLASSIFY_REQUESTS, "outcome" => outcome).increment(1);
    histogram!(CLASSIFY_DURATION).record(elapsed.as_secs_f64());
}

pub fn record_columns(outcome: &'static str) {
    counter!(COLUMNS_REQUESTS, "outcome" => outcome).increment(1);
}
