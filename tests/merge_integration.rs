use std::{collections::HashSet, sync::Arc};

use gridcover::{
    BoundingBox, CellPredicate, CellQuery, CellStatus, CellStore, GridCell, GridError,
    InMemoryCellStore, MergeConfig, MergeOptimizer, ScanRunner,
};
use rstest::rstest;

mod fixtures;
use fixtures::*;

fn completed(
    bbox: BoundingBox,
    results: u32,
) -> GridCell {
    let mut cell = GridCell::root("v1", bbox);
    cell.status = CellStatus::Completed;
    cell.results_count = results;
    cell
}

fn scanned_store() -> Arc<InMemoryCellStore> {
    let store = Arc::new(InMemoryCellStore::new());
    let runner = ScanRunner::new(manager(store.clone(), fine_config()), PointSetSearch::new(places()));
    runner.manager().initialize_grid("v1").unwrap();
    runner.run("v1", None).unwrap();
    store
}

#[rstest]
#[case(40, false)]
#[case(44, false)]
#[case(45, true)]
#[case(60, true)]
fn test_merge_respects_result_budget(
    #[case] max_merged_results: u32,
    #[case] merges: bool,
) {
    let cells = vec![
        completed(BoundingBox::new(48.0, 9.0, 48.05, 9.05), 25),
        completed(BoundingBox::new(48.05, 9.0, 48.1, 9.05), 20),
    ];
    let optimizer = MergeOptimizer::new(
        Arc::new(InMemoryCellStore::new()),
        MergeConfig {
            max_merged_results,
            max_merged_cell_size_km: 20.0,
        },
    );
    assert_eq!(!optimizer.find_merge_candidates(&cells).is_empty(), merges);
    let expected_len = if merges { 1 } else { 2 };
    assert_eq!(optimizer.perform_merges(cells).len(), expected_len);
}

#[test]
fn test_cells_of_different_depth_do_not_merge() {
    let mut deep = completed(BoundingBox::new(48.05, 9.0, 48.1, 9.025), 1);
    deep.level = 2;
    let cells = vec![
        completed(BoundingBox::new(48.0, 9.0, 48.05, 9.05), 1),
        deep,
    ];
    let optimizer = MergeOptimizer::new(
        Arc::new(InMemoryCellStore::new()),
        MergeConfig {
            max_merged_results: 40,
            max_merged_cell_size_km: 50.0,
        },
    );
    assert!(optimizer.find_merge_candidates(&cells).is_empty());
}

#[test]
fn test_optimize_shrinks_grid_and_keeps_coverage() {
    let store = scanned_store();
    let optimizer = MergeOptimizer::new(store.clone(), fine_config().merge);
    assert!(optimizer.is_grid_complete("v1").unwrap());

    let leaves = optimizer.get_leaf_cells("v1").unwrap();
    let report = optimizer.optimize_grid("v1", "v2").unwrap().unwrap();
    assert_eq!(report.original_leaf_cell_count, leaves.len());
    assert!(report.cells_saved > 0);
    assert_eq!(
        report.cells_saved,
        report.original_leaf_cell_count - report.merged_cell_count
    );

    let next = store.query(&CellQuery::version("v2")).unwrap();
    assert_eq!(next.len(), report.merged_cell_count);
    assert!(next
        .iter()
        .all(|c| c.status == CellStatus::Pending && c.found_place_ids.is_empty()));

    let before: f64 = leaves.iter().map(|c| c.bbox.area()).sum();
    let after: f64 = next.iter().map(|c| c.bbox.area()).sum();
    assert!(((before - after) / before).abs() < 1e-9);

    // No two next-generation cells overlap.
    for (i, a) in next.iter().enumerate() {
        for b in &next[i + 1..] {
            assert!(!a.bbox.overlaps(&b.bbox), "{} overlaps {}", a.bbox, b.bbox);
        }
    }
}

#[test]
fn test_rescanning_optimized_grid_needs_no_splits() {
    let store = scanned_store();
    let optimizer = MergeOptimizer::new(store.clone(), fine_config().merge);
    let report = optimizer.optimize_grid("v1", "v2").unwrap().unwrap();

    let search = PointSetSearch::new(places());
    let expected: HashSet<String> = search.ids().into_iter().collect();
    let runner = ScanRunner::new(manager(store.clone(), fine_config()), search);
    let summary = runner.run("v2", None).unwrap();

    assert_eq!(summary.split, 0);
    assert_eq!(summary.completed, report.merged_cell_count);
    let found: HashSet<String> = store
        .query(&CellQuery::version("v2").filter(CellPredicate::StatusIs(CellStatus::Completed)))
        .unwrap()
        .into_iter()
        .flat_map(|c| c.found_place_ids)
        .collect();
    assert_eq!(found, expected);
}

#[test]
fn test_optimize_is_deferred_while_scanning() {
    let store = Arc::new(InMemoryCellStore::new());
    manager(store.clone(), fine_config())
        .initialize_grid("v1")
        .unwrap();
    let optimizer = MergeOptimizer::new(store.clone(), fine_config().merge);
    assert_eq!(optimizer.optimize_grid("v1", "v2").unwrap(), None);
    assert_eq!(store.count(&CellQuery::version("v2")).unwrap(), 0);
}

#[test]
fn test_optimize_repeats_until_target_is_scanned() {
    let store = scanned_store();
    let optimizer = MergeOptimizer::new(store.clone(), fine_config().merge);
    let first = optimizer.optimize_grid("v1", "v2").unwrap().unwrap();
    let again = optimizer.optimize_grid("v1", "v2").unwrap().unwrap();
    assert_eq!(first, again);
    assert_eq!(
        store.count(&CellQuery::version("v2")).unwrap(),
        first.merged_cell_count
    );

    // Once a worker has claimed a cell the target is no longer rewritable.
    let m = manager(store.clone(), fine_config());
    let mut cell = m.get_next_cell("v2").unwrap().unwrap();
    m.mark_as_processing(&mut cell).unwrap();
    let err = optimizer.optimize_grid("v1", "v2").unwrap_err();
    assert!(matches!(err, GridError::TargetVersionNotEmpty { .. }));
}
