//! Owns the persisted cells of one grid version and moves them through
//! `PENDING -> PROCESSING -> {COMPLETED, SPLIT}`.
//!
//! Claiming is optimistic: two workers racing between `get_next_cell` and
//! `mark_as_processing` may both take the same cell. Reprocessing overwrites
//! results, so the cost is a duplicate search call, never corrupt data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::GridConfig,
    engine::{CellOrder, CellPredicate, CellQuery, CellStore},
    error::{GridError, GridResult, StoreError},
    geometry::{Axis, Boundary},
    grid::{generate_grid, CellId, CellStatus, GridCell},
};

/// What `split_cell` did with a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitOutcome {
    /// The cell is now `SPLIT`; `children` are the halves that intersect the
    /// boundary (zero, one or two).
    Split {
        axis: Axis,
        children: Vec<GridCell>,
    },
    /// `level` reached `max_depth`; the cell was completed with its
    /// overflowing result count.
    DepthExhausted,
    /// Halving would go below `min_cell_size_m`; completed as well.
    MinSizeReached,
}

/// Cell counts of one grid version by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GridStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub split: usize,
}

pub struct CellLifecycleManager<S: CellStore> {
    store: Arc<S>,
    boundary: Arc<Boundary>,
    config: GridConfig,
}

////////////////////////////////////////////////////////////////////////////////
// Inherent methods
////////////////////////////////////////////////////////////////////////////////

impl GridStats {
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.split
    }

    /// No pending or processing cells remain.
    pub fn is_complete(&self) -> bool {
        self.pending == 0 && self.processing == 0
    }
}

impl<S: CellStore> CellLifecycleManager<S> {
    /// `config` is expected to be validated already.
    pub fn new(
        store: Arc<S>,
        boundary: Arc<Boundary>,
        config: GridConfig,
    ) -> Self {
        Self {
            store,
            boundary,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Persists the base grid of `grid_version` as pending level-0 cells.
    ///
    /// Does nothing if the version already has cells. Returns the number of
    /// cells created.
    #[instrument(skip(self))]
    pub fn initialize_grid(
        &self,
        grid_version: &str,
    ) -> GridResult<usize> {
        let existing = self.store.count(&CellQuery::version(grid_version))?;
        if existing > 0 {
            debug!(existing, "Grid version already initialized");
            return Ok(0);
        }

        let tiles = generate_grid(&self.boundary, self.config.base_cell_size_km);
        for tile in &tiles {
            self.store.create(&GridCell::root(grid_version, *tile))?;
        }

        info!(
            boundary = self.boundary.name(),
            cells = tiles.len(),
            base_cell_size_km = self.config.base_cell_size_km,
            "Grid initialized"
        );
        Ok(tiles.len())
    }

    /// Oldest workable cell of `grid_version`, or `None` when the scan is
    /// done (or every remaining cell is freshly in flight).
    pub fn get_next_cell(
        &self,
        grid_version: &str,
    ) -> GridResult<Option<GridCell>> {
        self.get_next_cell_at(grid_version, Utc::now())
    }

    /// [`get_next_cell`](Self::get_next_cell) evaluated at `now`.
    ///
    /// Workable means pending, or processing with `last_processed_at` older
    /// than the staleness window: the claim of a crashed worker.
    pub fn get_next_cell_at(
        &self,
        grid_version: &str,
        now: DateTime<Utc>,
    ) -> GridResult<Option<GridCell>> {
        let cutoff = now - self.config.staleness_window();
        let query = CellQuery::version(grid_version)
            .filter(CellPredicate::claimable(cutoff))
            .order(CellOrder::OldestProcessedFirst)
            .limit(1);

        let next = self.store.query(&query)?.into_iter().next();
        if let Some(cell) = &next {
            if cell.status == CellStatus::Processing {
                warn!(
                    cell = %cell.id,
                    last_processed_at = ?cell.last_processed_at,
                    "Reclaiming stale cell"
                );
            }
        }
        Ok(next)
    }

    /// Claims `cell`. Must be persisted before the search call so other
    /// workers see the cell in flight.
    pub fn mark_as_processing(
        &self,
        cell: &mut GridCell,
    ) -> GridResult<()> {
        cell.status = CellStatus::Processing;
        cell.last_processed_at = Some(Utc::now());
        self.store.upsert(cell)?;
        debug!(cell = %cell.id, level = cell.level, "Cell claimed");
        Ok(())
    }

    /// Loads a cell that can still take search results: pending, or
    /// processing under any claim.
    pub fn open_cell(
        &self,
        id: &CellId,
    ) -> GridResult<GridCell> {
        let cell = self
            .store
            .get(id)?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        match cell.status {
            CellStatus::Pending | CellStatus::Processing => Ok(cell),
            status => Err(GridError::CellClosed { cell: *id, status }),
        }
    }

    /// Records the search results of `cell` and marks it completed.
    pub fn complete_cell(
        &self,
        cell: &mut GridCell,
        results_count: u32,
        found_place_ids: Vec<String>,
    ) -> GridResult<()> {
        cell.results_count = results_count;
        cell.found_place_ids = found_place_ids;
        self.finish(cell)
    }

    /// Splits an overloaded cell along its physically longer side.
    ///
    /// Falls back to completing the cell (accepting the overflow) when the
    /// depth or size budget is spent. Children are persisted before the
    /// parent is retired, so a crash in between leaves the parent
    /// claimable. A retried split reuses children that already exist for
    /// this parent and box instead of creating duplicates.
    #[instrument(skip_all, fields(cell = %cell.id, level = cell.level))]
    pub fn split_cell(
        &self,
        cell: &mut GridCell,
    ) -> GridResult<SplitOutcome> {
        let subdivision = &self.config.subdivision;
        if cell.level >= subdivision.max_depth {
            warn!(
                results = cell.results_count,
                "Depth budget exhausted, accepting overflow"
            );
            self.finish(cell)?;
            return Ok(SplitOutcome::DepthExhausted);
        }

        let shorter_km = cell.bbox.height_km().min(cell.bbox.width_km());
        if shorter_km / 2.0 < subdivision.min_cell_size_km() {
            warn!(
                results = cell.results_count,
                shorter_km, "Minimum cell size reached, accepting overflow"
            );
            self.finish(cell)?;
            return Ok(SplitOutcome::MinSizeReached);
        }

        let axis = cell.bbox.longer_axis();
        let existing = self.store.query(
            &CellQuery::version(cell.grid_version.as_str())
                .filter(CellPredicate::ParentIs(cell.id)),
        )?;

        let mut children = Vec::with_capacity(2);
        for half in cell.bbox.split_at_midpoint(axis) {
            if !self.boundary.intersects(&half) {
                continue;
            }
            if let Some(found) = existing.iter().find(|c| c.bbox.approx_eq(&half)) {
                debug!(child = %found.id, "Reusing child from an earlier split attempt");
                children.push(found.clone());
                continue;
            }
            let child = GridCell::child_of(cell, half);
            self.store.create(&child)?;
            children.push(child);
        }

        cell.status = CellStatus::Split;
        self.store.upsert(cell)?;

        info!(
            %axis,
            children = children.len(),
            results = cell.results_count,
            "Cell split"
        );
        Ok(SplitOutcome::Split { axis, children })
    }

    /// Per-status cell counts of `grid_version`.
    pub fn grid_stats(
        &self,
        grid_version: &str,
    ) -> GridResult<GridStats> {
        grid_stats(self.store.as_ref(), grid_version)
    }

    fn finish(
        &self,
        cell: &mut GridCell,
    ) -> GridResult<()> {
        cell.status = CellStatus::Completed;
        self.store.upsert(cell)?;
        debug!(cell = %cell.id, results = cell.results_count, "Cell completed");
        Ok(())
    }
}

/// Per-status cell counts of `grid_version`, straight from a store.
pub fn grid_stats<S: CellStore + ?Sized>(
    store: &S,
    grid_version: &str,
) -> GridResult<GridStats> {
    let mut stats = GridStats::default();
    for cell in store.query(&CellQuery::version(grid_version))? {
        match cell.status {
            CellStatus::Pending => stats.pending += 1,
            CellStatus::Processing => stats.processing += 1,
            CellStatus::Completed => stats.completed += 1,
            CellStatus::Split => stats.split += 1,
        }
    }
    Ok(stats)
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
