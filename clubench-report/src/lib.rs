#![warn(missing_docs)]
//! Clubench Report
//!
//! Consolidates the per-algorithm resource-consumption logs produced by the
//! timing wrapper into per-measure summary reports: a compact tab-separated
//! table and an extended human-readable file, both appended per aggregation
//! run so history accumulates across benchmark generations.

mod aggregate;

pub use aggregate::{AggregateError, Aggregator, MEASURES};
