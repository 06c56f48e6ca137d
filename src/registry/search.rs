//! Emptiness queries and the free-space searches.
//!
//! Two searches exist and are not interchangeable:
//! - the ring search expands square rings around a centre and is used
//!   to rehome dropped blocks
//! - the row searches stay on one row; the zigzag form serves policies
//!   looking for a spot near a column, the left-to-right form lays out
//!   equations
//!
//! The player never makes a unit non-empty.

use super::Registry;
use crate::core::types::{Coord, Event, ObjId, Size};
use crate::spatial::grid::Grid;

/// Units on the square ring `layer` steps out from `centre`, in scan
/// order: the top edge left to right, the bottom edge left to right, then
/// the left column and the right column top to bottom without corners.
/// Layer 0 is the centre alone.
pub fn ring_coords(centre: Coord, layer: i32) -> Vec<Coord> {
    if layer <= 0 {
        return vec![centre];
    }
    let (top, bottom) = (centre.row - layer, centre.row + layer);
    let (left, right) = (centre.col - layer, centre.col + layer);
    let mut ring = Vec::with_capacity(8 * layer as usize);
    ring.extend((left..=right).map(|col| Coord::new(top, col)));
    ring.extend((left..=right).map(|col| Coord::new(bottom, col)));
    ring.extend((top + 1..bottom).map(|row| Coord::new(row, left)));
    ring.extend((top + 1..bottom).map(|row| Coord::new(row, right)));
    ring
}

impl Registry {
    /// True if the unit is on the grid and holds nothing but (maybe) the player
    pub fn is_empty(&self, coord: Coord) -> bool {
        self.grid.is_inbounds(coord, Size::UNIT) && self.index.count_nonplayer(coord) == 0
    }

    /// True if every unit of the rectangle is empty, not counting `ignore`
    pub fn is_footprint_empty(&self, coord: Coord, size: Size, ignore: Option<ObjId>) -> bool {
        if !self.grid.is_inbounds(coord, size) {
            return false;
        }
        Grid::footprint(coord, size).all(|cell| {
            self.index
                .objs_at(cell)
                .all(|(kind, id)| kind.is_player() || Some(id) == ignore)
        })
    }

    pub fn is_playable(&self, coord: Coord) -> bool {
        self.grid.is_playable(coord, Size::UNIT)
    }

    /// True if a playable unit holds two or more objects besides the player
    pub fn is_overlapped(&self, coord: Coord) -> bool {
        self.is_playable(coord) && self.index.count_nonplayer(coord) >= 2
    }

    /// Ring search without side effects: the first anchor, ring by ring
    /// out to the grid's larger dimension, where a rectangle of `size`
    /// is playable and empty. The centre itself is not considered.
    pub fn search_space(&self, centre: Coord, size: Size, ignore: Option<ObjId>) -> Option<Coord> {
        let (rows, cols) = self.grid.shape();
        (1..=rows.max(cols))
            .flat_map(|layer| ring_coords(centre, layer))
            .find(|c| self.grid.is_playable(*c, size) && self.is_footprint_empty(*c, size, ignore))
    }

    /// Nearest free playable unit around `centre`. Raises `Full` and
    /// returns `None` if the grid has none.
    pub fn find_space(&mut self, centre: Coord) -> Option<Coord> {
        self.find_space_for(Size::UNIT, centre, None)
    }

    /// `find_space` for a rectangle, ignoring one object (usually the one
    /// being rehomed)
    pub fn find_space_for(
        &mut self,
        size: Size,
        centre: Coord,
        ignore: Option<ObjId>,
    ) -> Option<Coord> {
        let found = self.search_space(centre, size, ignore);
        if found.is_none() {
            self.raise(Event::Full);
        }
        found
    }

    /// Nearest empty unit on the seed's row, trying the seed column and
    /// then alternately right and left of it: +1, -1, +2, -2, ...
    pub fn find_empty_space_along_row(&self, seed: Coord) -> Option<Coord> {
        let (_, cols) = self.grid.shape();
        std::iter::once(0)
            .chain((1..=cols).flat_map(|d| [d, -d]))
            .map(|d| Coord::new(seed.row, seed.col + d))
            .find(|c| self.is_empty(*c))
    }

    /// First anchor on `row`, scanning right from `min_col`, where a
    /// rectangle of `size` lies on the grid and is empty
    pub fn avail_coord_on_row(&self, row: i32, min_col: i32, size: Size) -> Option<Coord> {
        let (_, cols) = self.grid.shape();
        (min_col.max(0)..cols)
            .map(|col| Coord::new(row, col))
            .find(|c| self.is_footprint_empty(*c, size, None))
    }
}
