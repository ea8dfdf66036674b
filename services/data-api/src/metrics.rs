//! Request and load metrics.

use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_request(endpoint: &'static str) {
    counter!("data_api_requests_total", "endpoint" => endpoint).increment(1);
}

pub fn record_missing_file(dataset: &'static str) {
    counter!("data_api_missing_files_total", "dataset" => dataset).increment(1);
}

pub fn record_read_error(dataset: &'static str) {
    counter!("data_api_read_errors_total", "dataset" => dataset).increment(1);
}

pub fn record_load_duration(dataset: &'static str, elapsed: Duration) {
    histogram!("data_api_load_duration_ms", "dataset" => dataset)
        .record(elapsed.as_secs_f64() * 1000.0);
}
