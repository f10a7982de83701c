#![warn(missing_docs)]
//! Clubench Stats
//!
//! Streaming statistics over per-run measurement series: many samples are
//! merged into `{count, sum, min, max, avg}` without retaining the raw
//! values, so aggregation over arbitrarily long resource logs stays O(1)
//! per sample.

mod accum;

pub use accum::StatAccumulator;
