//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured diagnostics on stderr)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Operator terminal / log aggregation
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Captured requests are not diagnostics; they flow through `capture`
//! - Every request runs in a span carrying a generated request ID
//! - Metrics are cheap when no exporter is installed

pub mod logging;
pub mod metrics;
