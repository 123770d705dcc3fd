//! Drives a grid version to completion against a place search provider.

pub mod runner;
pub mod search;

pub use runner::{ScanRunner, ScanStep, ScanSummary};
pub use search::{PlaceSearch, SearchFailure, SearchOutcome};
