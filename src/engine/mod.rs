//! Cell storage.
//!
//! - `storage`: the `CellStore` trait and the typed query it answers.
//! - `memory`: `DashMap`-backed store for tests and single-process runs.
//! - `persistent`: JSON-lines journal that survives restarts.

pub mod memory;
pub mod persistent;
pub mod storage;

pub use memory::*;
pub use persistent::*;
pub use storage::*;
