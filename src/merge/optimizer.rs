//! Coalesces sparse leaf cells of a finished scan into a smaller next
//! generation grid.
//!
//! The optimizer assumes exclusive access to the source version: it only
//! reads it, but nothing stops a late worker from completing a cell while it
//! runs. Callers should confirm the version is stable first.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::candidate::MergeCandidate;
use crate::{
    config::MergeConfig,
    engine::{CellPredicate, CellQuery, CellStore},
    error::{GridError, GridResult},
    grid::{CellId, CellStatus, GridCell},
};

/// Summary of one `optimize_grid` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptimizationReport {
    pub original_leaf_cell_count: usize,
    pub merged_cell_count: usize,
    pub cells_saved: usize,
}

pub struct MergeOptimizer<S: CellStore> {
    store: Arc<S>,
    config: MergeConfig,
}

impl<S: CellStore> MergeOptimizer<S> {
    pub fn new(
        store: Arc<S>,
        config: MergeConfig,
    ) -> Self {
        Self { store, config }
    }

    /// No cell of `grid_version` is pending or processing.
    pub fn is_grid_complete(
        &self,
        grid_version: &str,
    ) -> GridResult<bool> {
        let unsettled = self
            .store
            .count(&CellQuery::version(grid_version).filter(CellPredicate::unsettled()))?;
        Ok(unsettled == 0)
    }

    /// Completed cells of `grid_version`, south-west corner first.
    ///
    /// The fixed order makes the greedy merge repeatable for the same
    /// stored grid.
    pub fn get_leaf_cells(
        &self,
        grid_version: &str,
    ) -> GridResult<Vec<GridCell>> {
        let mut leaves = self.store.query(
            &CellQuery::version(grid_version).filter(CellPredicate::StatusIs(CellStatus::Completed)),
        )?;
        leaves.sort_by(|a, b| {
            a.bbox
                .min_lat
                .total_cmp(&b.bbox.min_lat)
                .then(a.bbox.min_lon.total_cmp(&b.bbox.min_lon))
        });
        Ok(leaves)
    }

    /// Every pair of `leaf_cells` that may be merged, least dense first.
    ///
    /// A pair qualifies when the cells share a full edge, their summed
    /// results stay within `max_merged_results` and neither side of the
    /// merged box exceeds `max_merged_cell_size_km`. Ties keep pair order.
    pub fn find_merge_candidates<'a>(
        &self,
        leaf_cells: &'a [GridCell],
    ) -> Vec<MergeCandidate<'a>> {
        let mut candidates = Vec::new();
        for (i, a) in leaf_cells.iter().enumerate() {
            for b in &leaf_cells[i + 1..] {
                if a.results_count.saturating_add(b.results_count) > self.config.max_merged_results {
                    continue;
                }
                let Some(candidate) = MergeCandidate::pair(a, b) else {
                    continue;
                };
                let merged = &candidate.merged_bbox;
                if merged.height_km() > self.config.max_merged_cell_size_km
                    || merged.width_km() > self.config.max_merged_cell_size_km
                {
                    continue;
                }
                candidates.push(candidate);
            }
        }
        candidates.sort_by_key(|c| c.combined_results_count);
        candidates
    }

    /// Greedily merges the cheapest pair until no candidate remains.
    ///
    /// Merged cells go to the end of the set and may merge again.
    pub fn perform_merges(
        &self,
        leaf_cells: Vec<GridCell>,
    ) -> Vec<GridCell> {
        let mut cells = leaf_cells;
        let mut rounds = 0usize;
        loop {
            let next = self
                .find_merge_candidates(&cells)
                .first()
                .map(|c| (c.cell_a.id, c.cell_b.id, c.synthesize()));
            let Some((a, b, merged)) = next else {
                break;
            };
            cells.retain(|c| c.id != a && c.id != b);
            cells.push(merged);
            rounds += 1;
        }
        debug!(rounds, cells = cells.len(), "Merging converged");
        cells
    }

    /// Builds `target_version` from the leaves of `source_version`.
    ///
    /// Returns `Ok(None)` while the source is still being scanned or has no
    /// leaves; the caller should retry later.
    ///
    /// The target version must be empty, or hold only untouched cells of an
    /// earlier run of the same plan: pending cells whose boxes all appear
    /// in the merged output. In that case the missing cells are written and
    /// the run completes, so a write that failed halfway can be retried.
    #[instrument(skip(self))]
    pub fn optimize_grid(
        &self,
        source_version: &str,
        target_version: &str,
    ) -> GridResult<Option<OptimizationReport>> {
        if !self.is_grid_complete(source_version)? {
            info!("Source grid still has open cells, skipping optimization");
            return Ok(None);
        }
        let leaves = self.get_leaf_cells(source_version)?;
        if leaves.is_empty() {
            info!("Source grid has no leaf cells, skipping optimization");
            return Ok(None);
        }

        let original_leaf_cell_count = leaves.len();
        let merged = self.perform_merges(leaves);

        let existing = self.store.query(&CellQuery::version(target_version))?;
        let resumable = existing.iter().all(|cell| {
            cell.status == CellStatus::Pending
                && merged.iter().any(|m| m.bbox.approx_eq(&cell.bbox))
        });
        if !resumable {
            return Err(GridError::TargetVersionNotEmpty {
                version: target_version.to_string(),
                cells: existing.len(),
            });
        }
        if !existing.is_empty() {
            info!(
                already_written = existing.len(),
                "Resuming an interrupted optimization"
            );
        }

        let missing = merged
            .iter()
            .filter(|m| !existing.iter().any(|cell| cell.bbox.approx_eq(&m.bbox)));
        for cell in missing {
            self.store.create(&GridCell {
                id: CellId::new(),
                grid_version: target_version.to_string(),
                status: CellStatus::Pending,
                found_place_ids: Vec::new(),
                last_processed_at: None,
                parent_id: None,
                ..cell.clone()
            })?;
        }

        let report = OptimizationReport {
            original_leaf_cell_count,
            merged_cell_count: merged.len(),
            cells_saved: original_leaf_cell_count - merged.len(),
        };
        info!(
            original = report.original_leaf_cell_count,
            merged = report.merged_cell_count,
            saved = report.cells_saved,
            "Grid optimized"
        );
        Ok(Some(report))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
