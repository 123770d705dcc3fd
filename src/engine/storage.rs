use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::{
    error::StoreResult,
    grid::{CellId, CellStatus, GridCell},
};

/// Persistent collection of grid cells.
///
/// Implementations must give read-your-writes consistency within one
/// worker. No cross-worker atomicity is expected: claiming is optimistic.
pub trait CellStore: Send + Sync {
    /// Inserts a new cell. Fails with `StoreError::AlreadyExists` if the id
    /// is taken.
    fn create(&self, cell: &GridCell) -> StoreResult<()>;
    /// Inserts or replaces the cell with the same id.
    fn upsert(&self, cell: &GridCell) -> StoreResult<()>;
    fn get(&self, id: &CellId) -> StoreResult<Option<GridCell>>;
    /// Cells matching `query`, ordered and limited as it asks.
    fn query(&self, query: &CellQuery) -> StoreResult<Vec<GridCell>>;
    /// Number of matching cells. `limit` and `order` are ignored.
    fn count(&self, query: &CellQuery) -> StoreResult<usize>;
}

/// Storage-agnostic filter over cells of one version.
#[derive(Debug, Clone, PartialEq)]
pub enum CellPredicate {
    Any,
    StatusIs(CellStatus),
    StatusIn(Vec<CellStatus>),
    ParentIs(CellId),
    /// Never processed, or last processed strictly before the instant.
    ProcessedBefore(DateTime<Utc>),
    And(Vec<CellPredicate>),
    Or(Vec<CellPredicate>),
    Not(Box<CellPredicate>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellOrder {
    #[default]
    Unordered,
    /// Ascending `last_processed_at`, never-processed first; ties by level,
    /// then by south-west corner.
    OldestProcessedFirst,
}

/// A predicate-and-order query scoped to one grid version.
#[derive(Debug, Clone, PartialEq)]
pub struct CellQuery {
    pub grid_version: String,
    pub predicate: CellPredicate,
    pub order: CellOrder,
    pub limit: Option<usize>,
}

////////////////////////////////////////////////////////////////////////////////
// Inherent methods
////////////////////////////////////////////////////////////////////////////////

impl CellPredicate {
    /// Pending, or processing with a claim made before `cutoff`.
    pub fn claimable(cutoff: DateTime<Utc>) -> Self {
        Self::Or(vec![
            Self::StatusIs(CellStatus::Pending),
            Self::And(vec![
                Self::StatusIs(CellStatus::Processing),
                Self::ProcessedBefore(cutoff),
            ]),
        ])
    }

    /// Anything that is neither completed nor split.
    pub fn unsettled() -> Self {
        Self::Not(Box::new(Self::StatusIn(vec![
            CellStatus::Completed,
            CellStatus::Split,
        ])))
    }

    pub fn matches(
        &self,
        cell: &GridCell,
    ) -> bool {
        match self {
            Self::Any => true,
            Self::StatusIs(status) => cell.status == *status,
            Self::StatusIn(statuses) => statuses.contains(&cell.status),
            Self::ParentIs(parent) => cell.parent_id.as_ref() == Some(parent),
            Self::ProcessedBefore(cutoff) => cell.last_processed_at.map_or(true, |at| at < *cutoff),
            Self::And(all) => all.iter().all(|p| p.matches(cell)),
            Self::Or(any) => any.iter().any(|p| p.matches(cell)),
            Self::Not(inner) => !inner.matches(cell),
        }
    }
}

impl CellQuery {
    /// Every cell of `grid_version`.
    pub fn version(grid_version: impl Into<String>) -> Self {
        Self {
            grid_version: grid_version.into(),
            predicate: CellPredicate::Any,
            order: CellOrder::Unordered,
            limit: None,
        }
    }

    pub fn filter(
        mut self,
        predicate: CellPredicate,
    ) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn order(
        mut self,
        order: CellOrder,
    ) -> Self {
        self.order = order;
        self
    }

    pub fn limit(
        mut self,
        limit: usize,
    ) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(
        &self,
        cell: &GridCell,
    ) -> bool {
        cell.grid_version == self.grid_version && self.predicate.matches(cell)
    }

    /// Applies order and limit to an already filtered set.
    pub fn finish(
        &self,
        mut cells: Vec<GridCell>,
    ) -> Vec<GridCell> {
        if self.order == CellOrder::OldestProcessedFirst {
            cells.sort_by(oldest_processed_first);
        }
        if let Some(limit) = self.limit {
            cells.truncate(limit);
        }
        cells
    }
}

fn oldest_processed_first(
    a: &GridCell,
    b: &GridCell,
) -> Ordering {
    a.last_processed_at
        .cmp(&b.last_processed_at)
        .then(a.level.cmp(&b.level))
        .then(a.bbox.min_lat.total_cmp(&b.bbox.min_lat))
        .then(a.bbox.min_lon.total_cmp(&b.bbox.min_lon))
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
