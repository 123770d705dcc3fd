//! Shared helpers for the integration tests: a deterministic place search
//! over a fixed point set and a few regions to scan.

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use gridcover::{
    Boundary, BoundingBox, CellLifecycleManager, CellStore, GridConfig, PlaceSearch,
    SearchFailure, SearchOutcome,
};

/// Pagination cap of the simulated provider.
pub const PAGE_CAP: usize = 60;

/// Answers with the places inside the rectangle (edges included), clipped
/// at [`PAGE_CAP`] like a paginated API would.
pub struct PointSetSearch {
    points: Vec<(String, f64, f64)>,
    calls: AtomicUsize,
}

impl PointSetSearch {
    pub fn new(points: Vec<(String, f64, f64)>) -> Self {
        Self {
            points,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn ids(&self) -> Vec<String> {
        self.points.iter().map(|(id, ..)| id.clone()).collect()
    }
}

impl PlaceSearch for PointSetSearch {
    fn search(
        &self,
        bbox: &BoundingBox,
    ) -> Result<SearchOutcome, SearchFailure> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let ids: Vec<String> = self
            .points
            .iter()
            .filter(|(_, lat, lon)| {
                *lat >= bbox.min_lat
                    && *lat <= bbox.max_lat
                    && *lon >= bbox.min_lon
                    && *lon <= bbox.max_lon
            })
            .map(|(id, ..)| id.clone())
            .take(PAGE_CAP)
            .collect();
        Ok(SearchOutcome::new(ids))
    }
}

/// Roughly 33 km x 22 km around Stuttgart.
pub fn region() -> BoundingBox {
    BoundingBox::new(48.6, 9.0, 48.9, 9.3)
}

/// A dense 15 x 14 lattice (about 1 km across) plus a sparse diagonal
/// scatter over the whole region.
pub fn places() -> Vec<(String, f64, f64)> {
    let mut points = Vec::new();
    for i in 0..15 {
        for j in 0..14 {
            points.push((
                format!("dense-{i}-{j}"),
                48.7003 + i as f64 * 0.00071,
                9.1007 + j as f64 * 0.00103,
            ));
        }
    }
    for k in 0..40 {
        points.push((
            format!("sparse-{k}"),
            48.6037 + k as f64 * 0.0073,
            9.0041 + k as f64 * 0.0071,
        ));
    }
    points
}

/// Split budget deep and fine enough that the dense lattice never has to
/// be accepted as overflow.
pub fn fine_config() -> GridConfig {
    GridConfig::builder()
        .max_depth(12)
        .min_cell_size_m(50.0)
        .build()
        .expect("valid config")
}

pub fn manager<S: CellStore>(
    store: Arc<S>,
    config: GridConfig,
) -> CellLifecycleManager<S> {
    let boundary = Boundary::from_rect("stuttgart", region()).expect("valid boundary");
    CellLifecycleManager::new(store, Arc::new(boundary), config)
}
