//! Next-generation grid synthesis from a completed scan.

pub mod candidate;
pub mod optimizer;

pub use candidate::MergeCandidate;
pub use optimizer::{MergeOptimizer, OptimizationReport};
