//! Grid geometry and the coordinate index

pub mod grid;
pub mod index;

pub use grid::Grid;
pub use index::{CellContents, SpatialIndex};
