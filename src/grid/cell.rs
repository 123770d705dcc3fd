use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use geo::Polygon;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::BoundingBox;

/// Opaque cell key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(Uuid);

/// Position of a cell in its scan state machine.
///
/// `Pending -> Processing -> {Completed, Split}`. A `Processing` cell whose
/// claim went stale may be claimed again; `Split` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellStatus {
    Pending,
    Processing,
    Completed,
    Split,
}

/// One search rectangle of a grid version.
///
/// Cells form a flat collection; the split tree is implied by `level`,
/// `parent_id` and the boxes. Cells are never deleted, split ones stay as
/// an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub id: CellId,
    pub grid_version: String,
    /// Subdivision depth, 0 for tiles of the base grid.
    pub level: u8,
    pub status: CellStatus,
    pub bbox: BoundingBox,
    pub results_count: u32,
    pub found_place_ids: Vec<String>,
    /// `None` until the cell is first claimed.
    pub last_processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parent_id: Option<CellId>,
}

////////////////////////////////////////////////////////////////////////////////
// Inherent methods
////////////////////////////////////////////////////////////////////////////////

impl CellId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl CellStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Split => "SPLIT",
        }
    }
}

impl GridCell {
    /// Fresh pending cell of the base grid.
    pub fn root(
        grid_version: impl Into<String>,
        bbox: BoundingBox,
    ) -> Self {
        Self::pending(grid_version.into(), 0, bbox, None)
    }

    /// Fresh pending cell one level below `parent`.
    pub fn child_of(
        parent: &GridCell,
        bbox: BoundingBox,
    ) -> Self {
        Self::pending(
            parent.grid_version.clone(),
            parent.level.saturating_add(1),
            bbox,
            Some(parent.id),
        )
    }

    pub(crate) fn pending(
        grid_version: String,
        level: u8,
        bbox: BoundingBox,
        parent_id: Option<CellId>,
    ) -> Self {
        Self {
            id: CellId::new(),
            grid_version,
            level,
            status: CellStatus::Pending,
            bbox,
            results_count: 0,
            found_place_ids: Vec::new(),
            last_processed_at: None,
            parent_id,
        }
    }

    /// Closed ring derived from the box.
    pub fn polygon(&self) -> Polygon<f64> {
        self.bbox.to_polygon()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Trait implementations
////////////////////////////////////////////////////////////////////////////////

impl Default for CellId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CellId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CellId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for CellStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
