//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! ResourceRouter produces:
//!     → logging.rs (structured log events, one span per query)
//!     → metrics.rs (counters, histograms)
//! ```
//!
//! # Design Decisions
//! - Each query carries a request ID in its span
//! - Metrics are cheap and silent until a recorder is installed

pub mod logging;
pub mod metrics;
