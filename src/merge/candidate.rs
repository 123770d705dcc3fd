//! A pair of neighbouring leaf cells and the cell they would merge into.

use crate::{
    geometry::{merge_bounding_boxes, shared_axis, Axis, BoundingBox},
    grid::GridCell,
};

/// Two edge-adjacent leaf cells that fit the merge budgets together.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeCandidate<'a> {
    pub cell_a: &'a GridCell,
    pub cell_b: &'a GridCell,
    pub combined_results_count: u32,
    pub merged_bbox: BoundingBox,
    pub shared_axis: Axis,
}

impl<'a> MergeCandidate<'a> {
    /// Pairs `a` and `b` if they share a full edge. Budgets are not checked
    /// here.
    pub fn pair(
        cell_a: &'a GridCell,
        cell_b: &'a GridCell,
    ) -> Option<Self> {
        let axis = shared_axis(&cell_a.bbox, &cell_b.bbox)?;
        Some(Self {
            cell_a,
            cell_b,
            combined_results_count: cell_a.results_count.saturating_add(cell_b.results_count),
            merged_bbox: merge_bounding_boxes(&cell_a.bbox, &cell_b.bbox),
            shared_axis: axis,
        })
    }

    /// Fresh pending cell covering both inputs, with the results summed and
    /// the shallower level kept.
    pub fn synthesize(&self) -> GridCell {
        let mut merged = GridCell::pending(
            self.cell_a.grid_version.clone(),
            self.cell_a.level.min(self.cell_b.level),
            self.merged_bbox,
            None,
        );
        merged.results_count = self.combined_results_count;
        merged
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
