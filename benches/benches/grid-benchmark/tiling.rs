use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gridcover::{
    generate_grid, grid::tile_bounding_box, Boundary, BoundaryDocument, BoundingBox, PolygonDocument,
};

/// -----------------------------
/// Utils
/// -----------------------------

fn region() -> BoundingBox {
    BoundingBox::new(48.0, 8.5, 49.0, 10.0)
}

/// Irregular 24-gon inscribed in the region, closer to a real city limit
/// than a rectangle.
fn ragged_boundary() -> Boundary {
    let (clat, clon) = (48.5, 9.25);
    let exterior = (0..=24)
        .map(|i| {
            let t = i as f64 / 24.0 * std::f64::consts::TAU;
            let r = if i % 2 == 0 { 0.45 } else { 0.33 };
            [clon + r * 1.5 * t.cos(), clat + r * t.sin()]
        })
        .collect();
    Boundary::from_document(BoundaryDocument {
        name: "ragged".into(),
        polygons: vec![PolygonDocument {
            exterior,
            interiors: Vec::new(),
        }],
    })
    .expect("valid boundary")
}

/// -----------------------------
/// Tiling benchmarks
/// -----------------------------

fn bench_tile_bounding_box(c: &mut Criterion) {
    let mut group = c.benchmark_group("tile_bounding_box");
    let bbox = region();
    for km in [5.0, 2.0, 1.0] {
        let tiles = tile_bounding_box(&bbox, km).len();
        group.throughput(Throughput::Elements(tiles as u64));
        group.bench_with_input(BenchmarkId::from_parameter(km), &km, |b, &km| {
            b.iter(|| black_box(tile_bounding_box(black_box(&bbox), km)))
        });
    }
    group.finish();
}

fn bench_generate_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_grid");
    let rect = Boundary::from_rect("rect", region()).expect("valid boundary");
    let ragged = ragged_boundary();
    for km in [5.0, 2.0] {
        group.bench_with_input(BenchmarkId::new("rect", km), &km, |b, &km| {
            b.iter(|| black_box(generate_grid(&rect, km)))
        });
        group.bench_with_input(BenchmarkId::new("ragged", km), &km, |b, &km| {
            b.iter(|| black_box(generate_grid(&ragged, km)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tile_bounding_box, bench_generate_grid);
criterion_main!(benches);
