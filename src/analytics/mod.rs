//! Trip analytics.
//!
//! This module owns the cleaned trip table, computes the metric bundle
//! consumed by the chart renderer and the report exporter, and hosts the
//! pure numerical helpers behind the statistics.

pub mod engine;
pub mod numerical;
pub mod types;
