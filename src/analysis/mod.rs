//! Analysis modules.
//!
//! Aggregation of payroll records into the report's derived tables, plus
//! the descriptive statistics it relies on.

pub mod aggregator;
pub mod stats;

pub use aggregator::*;
