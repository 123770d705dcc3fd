//! Geometry kernel: km/degree conversion, rectangle construction,
//! boundary intersection, edge adjacency and box union.

pub mod bbox;
pub mod boundary;

pub use bbox::*;
pub use boundary::*;
