//! Single-worker dispatch loop: claim a cell, search it, then complete or
//! split it depending on how dense the answer was.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::search::PlaceSearch;
use crate::{
    engine::CellStore,
    error::{GridError, GridResult},
    grid::GridCell,
    lifecycle::{CellLifecycleManager, SplitOutcome},
};

/// Result of one [`ScanRunner::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScanStep {
    /// Nothing left to claim.
    Idle,
    /// The cell was under the density threshold.
    Completed(GridCell),
    /// The cell was over the threshold and got subdivided.
    Split {
        cell: GridCell,
        children: Vec<GridCell>,
    },
    /// Over the threshold, but the depth or size budget was spent.
    OverflowAccepted(GridCell),
}

/// Counters of a [`ScanRunner::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub steps: usize,
    pub completed: usize,
    pub split: usize,
    pub overflowed: usize,
    pub children_created: usize,
}

pub struct ScanRunner<S: CellStore, P: PlaceSearch> {
    manager: CellLifecycleManager<S>,
    search: P,
}

impl<S: CellStore, P: PlaceSearch> ScanRunner<S, P> {
    pub fn new(
        manager: CellLifecycleManager<S>,
        search: P,
    ) -> Self {
        Self { manager, search }
    }

    pub fn manager(&self) -> &CellLifecycleManager<S> {
        &self.manager
    }

    pub fn search(&self) -> &P {
        &self.search
    }

    /// Processes one cell of `grid_version`.
    ///
    /// On a search failure the claimed cell stays `PROCESSING` and becomes
    /// claimable again once the staleness window has passed.
    pub fn step(
        &self,
        grid_version: &str,
    ) -> GridResult<ScanStep> {
        let Some(mut cell) = self.manager.get_next_cell(grid_version)? else {
            return Ok(ScanStep::Idle);
        };
        self.manager.mark_as_processing(&mut cell)?;

        let outcome = self.search.search(&cell.bbox).map_err(|source| {
            warn!(cell = %cell.id, error = %source, "Search failed");
            GridError::Search {
                cell: cell.id,
                source,
            }
        })?;
        debug!(cell = %cell.id, results = outcome.results_count, "Search answered");

        if outcome.results_count < self.manager.config().subdivision.threshold {
            self.manager
                .complete_cell(&mut cell, outcome.results_count, outcome.place_ids)?;
            return Ok(ScanStep::Completed(cell));
        }

        // Kept on the cell so an accepted overflow persists what was found.
        cell.results_count = outcome.results_count;
        cell.found_place_ids = outcome.place_ids;
        match self.manager.split_cell(&mut cell)? {
            SplitOutcome::Split { children, .. } => Ok(ScanStep::Split { cell, children }),
            SplitOutcome::DepthExhausted | SplitOutcome::MinSizeReached => {
                Ok(ScanStep::OverflowAccepted(cell))
            }
        }
    }

    /// Steps until the version is idle or `max_steps` cells were processed.
    pub fn run(
        &self,
        grid_version: &str,
        max_steps: Option<usize>,
    ) -> GridResult<ScanSummary> {
        let mut summary = ScanSummary::default();
        while max_steps.map_or(true, |max| summary.steps < max) {
            match self.step(grid_version)? {
                ScanStep::Idle => break,
                ScanStep::Completed(_) => summary.completed += 1,
                ScanStep::Split { children, .. } => {
                    summary.split += 1;
                    summary.children_created += children.len();
                }
                ScanStep::OverflowAccepted(_) => summary.overflowed += 1,
            }
            summary.steps += 1;
        }

        info!(
            grid_version,
            steps = summary.steps,
            completed = summary.completed,
            split = summary.split,
            overflowed = summary.overflowed,
            "Scan run finished"
        );
        Ok(summary)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
