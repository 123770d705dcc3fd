//! Cell state machine on top of a [`CellStore`](crate::engine::CellStore).

pub mod manager;

pub use manager::{grid_stats, CellLifecycleManager, GridStats, SplitOutcome};
