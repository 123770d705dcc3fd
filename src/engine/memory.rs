//! `DashMap`-backed cell store for tests, benches and short-lived scans.
//! Nothing survives the process.

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};

use super::storage::{CellQuery, CellStore};
use crate::{
    error::{StoreError, StoreResult},
    grid::{CellId, GridCell},
};

/// Cell store held entirely in memory. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct InMemoryCellStore {
    pub data: Arc<DashMap<CellId, GridCell>>,
}

impl InMemoryCellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl CellStore for InMemoryCellStore {
    fn create(&self, cell: &GridCell) -> StoreResult<()> {
        match self.data.entry(cell.id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists {
                id: cell.id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(cell.clone());
                Ok(())
            }
        }
    }

    fn upsert(&self, cell: &GridCell) -> StoreResult<()> {
        self.data.insert(cell.id, cell.clone());
        Ok(())
    }

    fn get(&self, id: &CellId) -> StoreResult<Option<GridCell>> {
        Ok(self.data.get(id).map(|entry| entry.clone()))
    }

    fn query(&self, query: &CellQuery) -> StoreResult<Vec<GridCell>> {
        let matched = self
            .data
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        Ok(query.finish(matched))
    }

    fn count(&self, query: &CellQuery) -> StoreResult<usize> {
        Ok(self
            .data
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .count())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::CellPredicate,
        geometry::BoundingBox,
        grid::CellStatus,
    };

    fn cell(version: &str) -> GridCell {
        GridCell::root(version, BoundingBox::new(0.0, 0.0, 0.1, 0.1))
    }

    /// Basic test to verify that a cell can be created and then retrieved.
    #[test]
    fn test_create_and_get() {
        let store = InMemoryCellStore::new();
        let c = cell("v1");
        store.create(&c).unwrap();
        assert_eq!(store.get(&c.id).unwrap(), Some(c));
        assert_eq!(store.len(), 1);
    }

    /// Creating the same id twice must fail and leave the first copy intact.
    #[test]
    fn test_create_duplicate_fails() {
        let store = InMemoryCellStore::new();
        let c = cell("v1");
        store.create(&c).unwrap();

        let mut dup = c.clone();
        dup.results_count = 99;
        let err = store.create(&dup).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.get(&c.id).unwrap().unwrap().results_count, 0);
    }

    /// Ensures that upsert overwrites.
    #[test]
    fn test_upsert_overwrites() {
        let store = InMemoryCellStore::new();
        let mut c = cell("v1");
        store.upsert(&c).unwrap();
        c.status = CellStatus::Completed;
        store.upsert(&c).unwrap();
        assert_eq!(
            store.get(&c.id).unwrap().unwrap().status,
            CellStatus::Completed
        );
    }

    #[test]
    fn test_query_and_count_by_version_and_status() {
        let store = InMemoryCellStore::new();
        let mut done = cell("v1");
        done.status = CellStatus::Completed;
        store.create(&done).unwrap();
        store.create(&cell("v1")).unwrap();
        store.create(&cell("v2")).unwrap();

        let all_v1 = CellQuery::version("v1");
        assert_eq!(store.count(&all_v1).unwrap(), 2);

        let pending = CellQuery::version("v1").filter(CellPredicate::StatusIs(CellStatus::Pending));
        let found = store.query(&pending).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].status, CellStatus::Pending);

        assert_eq!(store.query(&all_v1.clone().limit(1)).unwrap().len(), 1);
        assert_eq!(store.count(&all_v1.limit(1)).unwrap(), 2);
    }

    #[test]
    fn test_clones_share_data() {
        let store = InMemoryCellStore::new();
        let other = store.clone();
        store.create(&cell("v1")).unwrap();
        assert_eq!(other.len(), 1);
        assert!(InMemoryCellStore::new().is_empty());
    }
}
