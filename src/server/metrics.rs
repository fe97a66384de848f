use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all shelf metrics
const PREFIX: &str = "shelf";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Import Metrics
    pub static ref IMPORT_ROWS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_import_rows_total"), "CSV data rows received for import"),
        &["mode"]
    ).expect("Failed to create import_rows_total metric");

    pub static ref IMPORT_GROUPS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_import_groups_total"), "Import groups by outcome"),
        &["outcome"]
    ).expect("Failed to create import_groups_total metric");

    pub static ref IMPORT_ROWS_REJECTED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_import_rows_rejected_total"),
        "Import rows rejected by validation"
    ).expect("Failed to create import_rows_rejected_total metric");

    pub static ref IMPORT_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_import_duration_seconds"),
            "Duration of a whole import request in seconds"
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]),
        &["mode"]
    ).expect("Failed to create import_duration_seconds metric");

    pub static ref EXPORT_ROWS_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_export_rows_total"),
        "Rows written by collection exports"
    ).expect("Failed to create export_rows_total metric");

    // Database Metrics
    pub static ref DB_CONNECTION_ERRORS_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_db_connection_errors_total"),
        "Transactions that could not be started"
    ).expect("Failed to create db_connection_errors_total metric");

    // Collection Metrics
    pub static ref COLLECTION_ITEMS_TOTAL: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_collection_items_total"), "Rows in the collection"),
        &["type"]
    ).expect("Failed to create collection_items_total metric");

    // Error Metrics
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_errors_total"), "Total errors by type and endpoint"),
        &["error_type", "endpoint"]
    ).expect("Failed to create errors_total metric");

    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Register every metric with `REGISTRY`. Safe to call more than once.
pub fn init_metrics() {
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(IMPORT_ROWS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(IMPORT_GROUPS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(IMPORT_ROWS_REJECTED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(IMPORT_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(EXPORT_ROWS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(DB_CONNECTION_ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(COLLECTION_ITEMS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

pub fn set_collection_counts(physical_items: usize, media: usize, links: usize) {
    COLLECTION_ITEMS_TOTAL
        .with_label_values(&["physical_item"])
        .set(physical_items as f64);
    COLLECTION_ITEMS_TOTAL
        .with_label_values(&["media"])
        .set(media as f64);
    COLLECTION_ITEMS_TOTAL
        .with_label_values(&["link"])
        .set(links as f64);
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record the outcome of one import request
pub fn record_import(
    mode: &str,
    rows: usize,
    rejected_rows: usize,
    committed_groups: usize,
    rolled_back_groups: usize,
    duration: Duration,
) {
    IMPORT_ROWS_TOTAL
        .with_label_values(&[mode])
        .inc_by(rows as f64);
    IMPORT_ROWS_REJECTED_TOTAL.inc_by(rejected_rows as f64);
    IMPORT_GROUPS_TOTAL
        .with_label_values(&["committed"])
        .inc_by(committed_groups as f64);
    IMPORT_GROUPS_TOTAL
        .with_label_values(&["rolled_back"])
        .inc_by(rolled_back_groups as f64);
    IMPORT_DURATION_SECONDS
        .with_label_values(&[mode])
        .observe(duration.as_secs_f64());
}

pub fn record_export(rows: usize) {
    EXPORT_ROWS_TOTAL.inc_by(rows as f64);
}

/// Record a transaction that could not be started
pub fn record_db_connection_error() {
    DB_CONNECTION_ERRORS_TOTAL.inc();
}

/// Record an error
pub fn record_error(error_type: &str, endpoint: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, endpoint])
        .inc();
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    // kB
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<f64>() {
                            PROCESS_MEMORY_BYTES.set(kb * 1024.0);
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
