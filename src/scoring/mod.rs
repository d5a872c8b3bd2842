//! Rule-based opportunity scoring.
//!
//! Maps dependency metrics to ordered tiers using the threshold tables
//! from the configuration. Scoring is pure and deterministic.

pub mod classifier;
pub mod family;
pub mod tiers;

pub use classifier::OpportunityClassifier;
pub use family::FamilyClassifier;
