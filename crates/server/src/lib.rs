//! HTTP surface of the aggregation engine.

pub mod api;
pub mod metrics;
pub mod state;
