//! Grid cells and the base-grid tiler.

pub mod cell;
pub mod tiler;

pub use cell::*;
pub use tiler::*;
