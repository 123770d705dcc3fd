use std::{hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use gridcover::{
    grid::tile_bounding_box, BoundingBox, CellStatus, GridCell, InMemoryCellStore, MergeConfig,
    MergeOptimizer,
};

/// Completed leaves over a region with a sparse, repeating density pattern.
fn leaves(km: f64) -> Vec<GridCell> {
    tile_bounding_box(&BoundingBox::new(48.0, 9.0, 48.4, 9.6), km)
        .into_iter()
        .enumerate()
        .map(|(i, bbox)| {
            let mut cell = GridCell::root("bench", bbox);
            cell.status = CellStatus::Completed;
            cell.results_count = (i % 7) as u32;
            cell
        })
        .collect()
}

fn optimizer() -> MergeOptimizer<InMemoryCellStore> {
    MergeOptimizer::new(
        Arc::new(InMemoryCellStore::new()),
        MergeConfig {
            max_merged_results: 40,
            max_merged_cell_size_km: 8.0,
        },
    )
}

fn bench_find_merge_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_merge_candidates");
    let opt = optimizer();
    for km in [4.0, 2.0] {
        let cells = leaves(km);
        group.bench_with_input(BenchmarkId::from_parameter(cells.len()), &cells, |b, cells| {
            b.iter(|| black_box(opt.find_merge_candidates(black_box(cells)).len()))
        });
    }
    group.finish();
}

fn bench_perform_merges(c: &mut Criterion) {
    let mut group = c.benchmark_group("perform_merges");
    group.sample_size(10);
    let opt = optimizer();
    let cells = leaves(4.0);
    group.bench_function(BenchmarkId::from_parameter(cells.len()), |b| {
        b.iter(|| black_box(opt.perform_merges(cells.clone()).len()))
    });
    group.finish();
}

criterion_group!(benches, bench_find_merge_candidates, bench_perform_merges);
criterion_main!(benches);
