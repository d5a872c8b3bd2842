//! Vendor dependency analysis.
//!
//! Normalization, per-entity aggregation and the fund family rollup.

pub mod aggregator;
pub mod family;
pub mod normalize;
pub mod recency;

pub use aggregator::{Aggregator, EntityKey};
pub use family::rollup;
