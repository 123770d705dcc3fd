/// Layered configuration: defaults, file, environment.
pub mod config;
/// Cell persistence: the store trait, in-memory and journal-backed stores.
pub mod engine;
/// Crate-level error type on top of `gridcover-error`.
pub mod error;
/// Bounding boxes, unit conversion, adjacency and boundary intersection.
pub mod geometry;
/// Grid cells and the base tiler.
pub mod grid;
/// Cell state machine: claim, split, complete.
pub mod lifecycle;
/// Logging setup (console and rolling file sinks).
pub mod logging;
/// Merging of sparse leaf cells into a next-generation grid.
pub mod merge;
/// Search dispatch loop.
pub mod scan;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

pub use self::config::{GridConfig, MergeConfig, Settings, StoreConfig, SubdivisionConfig};
pub use engine::{
    CellOrder, CellPredicate, CellQuery, CellStore, FileCellStore, InMemoryCellStore, SyncPolicy,
};
pub use error::{ConfigError, ErrorExt, GridError, GridResult, StatusCode, StoreError};
pub use geometry::{
    edge_adjacency, km_to_degrees_lat, km_to_degrees_lng, merge_bounding_boxes,
    rectangle_intersects_boundary, Axis, Boundary, BoundaryDocument, BoundingBox, PolygonDocument,
};
pub use grid::{generate_grid, CellId, CellStatus, GridCell};
pub use lifecycle::{grid_stats, CellLifecycleManager, GridStats, SplitOutcome};
pub use logging::{init_logging, LoggingConfig, LoggingHandle};
pub use merge::{MergeCandidate, MergeOptimizer, OptimizationReport};
pub use scan::{PlaceSearch, ScanRunner, ScanStep, ScanSummary, SearchFailure, SearchOutcome};
