//! API call counters.
//!
//! Counters go through the `metrics` facade and are no-ops until the host
//! process installs a recorder.

use metrics::counter;

pub fn record_api_success(op: &'static str) {
    counter!("garmin_api_total", "op" => op, "result" => "success").increment(1);
}

pub fn record_api_failure(op: &'static str) {
    counter!("garmin_api_total", "op" => op, "result" => "failure").increment(1);
}

/// Record the outcome of `result` under `op` and hand it back unchanged.
pub fn track<T, E>(op: &'static str, result: Result<T, E>) -> Result<T, E> {
    match &result {
        Ok(_) => record_api_success(op),
        Err(_) => record_api_failure(op),
    }
    result
}
