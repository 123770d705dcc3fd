use std::{collections::HashSet, sync::Arc};

use gridcover::{
    CellPredicate, CellQuery, CellStatus, CellStore, GridConfig, InMemoryCellStore, ScanRunner,
};

mod fixtures;
use fixtures::*;

fn found_ids<S: CellStore>(
    store: &S,
    version: &str,
) -> HashSet<String> {
    store
        .query(&CellQuery::version(version).filter(CellPredicate::StatusIs(CellStatus::Completed)))
        .unwrap()
        .into_iter()
        .flat_map(|c| c.found_place_ids)
        .collect()
}

#[test]
fn test_adaptive_scan_finds_every_place() {
    let store = Arc::new(InMemoryCellStore::new());
    let manager = manager(store.clone(), fine_config());
    let roots = manager.initialize_grid("v1").unwrap();
    assert!(roots > 100, "expected a few hundred base cells, got {roots}");

    let search = PointSetSearch::new(places());
    let expected: HashSet<String> = search.ids().into_iter().collect();
    let runner = ScanRunner::new(manager, search);
    let summary = runner.run("v1", None).unwrap();

    assert!(summary.split > 0, "the dense lattice must force splits");
    assert_eq!(summary.overflowed, 0);
    assert_eq!(summary.steps, runner.search().calls());
    assert_eq!(summary.steps, roots + summary.children_created);

    let stats = runner.manager().grid_stats("v1").unwrap();
    assert!(stats.is_complete());
    assert_eq!(stats.split, summary.split);
    assert_eq!(found_ids(store.as_ref(), "v1"), expected);
}

#[test]
fn test_leaves_partition_the_region() {
    let store = Arc::new(InMemoryCellStore::new());
    let runner = ScanRunner::new(manager(store.clone(), fine_config()), PointSetSearch::new(places()));
    runner.manager().initialize_grid("v1").unwrap();
    runner.run("v1", None).unwrap();

    let leaves = store
        .query(&CellQuery::version("v1").filter(CellPredicate::StatusIs(CellStatus::Completed)))
        .unwrap();
    let leaf_area: f64 = leaves.iter().map(|c| c.bbox.area()).sum();
    let region_area = region().area();
    assert!(
        ((leaf_area - region_area) / region_area).abs() < 1e-9,
        "leaves cover {leaf_area}, region is {region_area}"
    );

    for leaf in &leaves {
        assert!(leaf.results_count < 50);
        assert!(region().contains_box(&leaf.bbox));
    }
}

#[test]
fn test_shallow_depth_accepts_overflow() {
    let config = GridConfig::builder().max_depth(1).build().unwrap();
    let store = Arc::new(InMemoryCellStore::new());
    let runner = ScanRunner::new(manager(store.clone(), config), PointSetSearch::new(places()));
    runner.manager().initialize_grid("v1").unwrap();
    let summary = runner.run("v1", None).unwrap();

    assert!(summary.overflowed > 0);
    let overflowing = store
        .query(&CellQuery::version("v1").filter(CellPredicate::StatusIs(CellStatus::Completed)))
        .unwrap()
        .into_iter()
        .filter(|c| c.results_count >= 50)
        .collect::<Vec<_>>();
    assert!(!overflowing.is_empty());
    assert!(overflowing.iter().all(|c| c.level == 1 && !c.found_place_ids.is_empty()));
    assert!(runner.manager().grid_stats("v1").unwrap().is_complete());
}

#[test]
fn test_versions_are_independent() {
    let store = Arc::new(InMemoryCellStore::new());
    let runner = ScanRunner::new(manager(store.clone(), fine_config()), PointSetSearch::new(places()));
    runner.manager().initialize_grid("v1").unwrap();
    runner.manager().initialize_grid("v2").unwrap();

    runner.run("v1", None).unwrap();
    let v2 = runner.manager().grid_stats("v2").unwrap();
    assert_eq!(v2.pending, v2.total());
    assert!(runner.manager().grid_stats("v1").unwrap().is_complete());
}
