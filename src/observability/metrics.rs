//! Metrics collection.
//!
//! # Metrics
//! - `provider_queries_total` (counter): queries by resource kind and outcome
//! - `provider_query_duration_seconds` (histogram): time spent per query
//! - `provider_rows_returned` (histogram): rows per successful query
//! - `provider_unsupported_total` (counter): calls to unimplemented operations
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; with no recorder installed
//!   every call is a no-op
//! - Unmatched identifiers are labelled `kind="none"`

use std::time::Instant;

use crate::routing::types::Operation;

/// Record the outcome of a single query.
pub fn record_query(kind: &str, outcome: &'static str, start: Instant) {
    let kind = kind.to_string();
    metrics::counter!("provider_queries_total", "kind" => kind.clone(), "outcome" => outcome)
        .increment(1);
    metrics::histogram!("provider_query_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

/// Record the size of a successful result.
pub fn record_rows(kind: &str, rows: usize) {
    metrics::histogram!("provider_rows_returned", "kind" => kind.to_string()).record(rows as f64);
}

/// Record a call to an operation this provider does not implement.
pub fn record_unsupported(operation: Operation) {
    metrics::counter!("provider_unsupported_total", "operation" => operation.to_string())
        .increment(1);
}
