//! Edge-to-edge tiling of a region's bounding box.
//!
//! Rows have a fixed latitude step; the longitude step is recomputed for
//! every row so that tiles keep roughly the requested physical width at
//! any latitude. The last row and the last tile of each row are clamped to
//! the bounding box, so the unfiltered tiles cover it exactly.

use tracing::debug;

use crate::geometry::{km_to_degrees_lat, km_to_degrees_lng, Boundary, BoundingBox};

/// Tolerance on the step count, so that float noise in `span / step` does
/// not produce a sliver row or column.
const STEP_SLACK: f64 = 1e-9;

/// All tiles of `bbox` at `cell_size_km`, before any boundary filtering.
pub fn tile_bounding_box(
    bbox: &BoundingBox,
    cell_size_km: f64,
) -> Vec<BoundingBox> {
    if bbox.lat_span() <= 0.0 || bbox.lon_span() <= 0.0 || cell_size_km <= 0.0 {
        return Vec::new();
    }

    let lat_edges = edges(bbox.min_lat, bbox.max_lat, km_to_degrees_lat(cell_size_km));
    let mut tiles = Vec::new();

    for row in lat_edges.windows(2) {
        let (south, north) = (row[0], row[1]);
        let lng_step = km_to_degrees_lng(cell_size_km, (south + north) * 0.5);
        let lon_edges = edges(bbox.min_lon, bbox.max_lon, lng_step);
        tiles.extend(
            lon_edges
                .windows(2)
                .map(|col| BoundingBox::new(south, col[0], north, col[1])),
        );
    }

    tiles
}

/// Base grid of `boundary`: every tile of its bounding box that intersects
/// the boundary.
///
/// The boundary only decides inclusion, never tile geometry, so dropping a
/// tile cannot open a gap between the tiles that remain.
pub fn generate_grid(
    boundary: &Boundary,
    base_cell_size_km: f64,
) -> Vec<BoundingBox> {
    let all = tile_bounding_box(&boundary.bounding_box(), base_cell_size_km);
    let total = all.len();
    let kept: Vec<BoundingBox> = all
        .into_iter()
        .filter(|tile| boundary.intersects(tile))
        .collect();

    debug!(
        boundary = boundary.name(),
        base_cell_size_km,
        total,
        kept = kept.len(),
        "Tiled boundary"
    );
    kept
}

/// Edge coordinates from `min` to `max` in steps of `step`; the last edge
/// is exactly `max`.
fn edges(
    min: f64,
    max: f64,
    step: f64,
) -> Vec<f64> {
    let count = ((max - min) / step - STEP_SLACK).ceil().max(1.0) as usize;
    let mut out: Vec<f64> = (0..count).map(|i| min + i as f64 * step).collect();
    out.push(max);
    out
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
