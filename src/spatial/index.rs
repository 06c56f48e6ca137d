//! Coordinate -> kind -> object-set index
//!
//! Every live object is listed under every unit of its footprint and
//! nowhere else. Moves touch only the units that enter or leave the
//! footprint.

use crate::core::types::{Coord, ObjId, Size};
use crate::spatial::grid::Grid;
use crate::world::objects::{GameObject, ObjKind};
use ahash::{AHashMap, AHashSet};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Objects at one unit, grouped by kind
pub type CellContents = BTreeMap<ObjKind, BTreeSet<ObjId>>;

/// Where an object is currently indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    coord: Coord,
    size: Size,
    kind: ObjKind,
}

impl Placement {
    fn of(obj: &GameObject) -> Self {
        Self {
            coord: obj.coord,
            size: obj.size,
            kind: obj.kind,
        }
    }

    fn cells(&self) -> AHashSet<Coord> {
        Grid::all_coords(self.coord, self.size)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    cells: AHashMap<Coord, CellContents>,
    placements: AHashMap<ObjId, Placement>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.placements.clear();
    }

    /// Number of indexed objects
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn contains(&self, id: ObjId) -> bool {
        self.placements.contains_key(&id)
    }

    /// Anchor the object is indexed at
    pub fn coord_of(&self, id: ObjId) -> Option<Coord> {
        self.placements.get(&id).map(|p| p.coord)
    }

    /// Registers `obj` over its footprint, anchored at `coord` if given.
    /// An object that is already indexed is moved instead.
    pub fn add(&mut self, obj: &mut GameObject, coord: Option<Coord>) {
        let coord = coord.unwrap_or(obj.coord);
        if self.contains(obj.id) {
            self.move_obj(obj, coord);
            return;
        }
        obj.coord = coord;
        let placement = Placement::of(obj);
        for cell in Grid::footprint(placement.coord, placement.size) {
            self.insert_at(cell, placement.kind, obj.id);
        }
        self.placements.insert(obj.id, placement);
        debug_assert!(self.is_consistent(obj.id));
    }

    /// Erases the object from every unit it covers. Returns false if it
    /// was not indexed.
    pub fn remove(&mut self, id: ObjId) -> bool {
        let Some(placement) = self.placements.remove(&id) else {
            return false;
        };
        for cell in Grid::footprint(placement.coord, placement.size) {
            self.erase_at(cell, placement.kind, id);
        }
        true
    }

    /// Moves an indexed object, updating only the units that differ
    /// between the old and new footprints. Unindexed objects are left
    /// untouched.
    pub fn move_obj(&mut self, obj: &mut GameObject, new_coord: Coord) {
        let Some(placement) = self.placements.get(&obj.id).copied() else {
            return;
        };
        if placement.coord == new_coord {
            obj.coord = new_coord;
            return;
        }
        let old_cells = placement.cells();
        let new_cells = Grid::all_coords(new_coord, placement.size);

        for cell in old_cells.difference(&new_cells) {
            self.erase_at(*cell, placement.kind, obj.id);
        }
        for cell in new_cells.difference(&old_cells) {
            self.insert_at(*cell, placement.kind, obj.id);
        }
        self.placements.insert(
            obj.id,
            Placement {
                coord: new_coord,
                ..placement
            },
        );
        trace!(id = obj.id.0, from = ?placement.coord, to = ?new_coord, "index move");
        obj.coord = new_coord;
        debug_assert!(self.is_consistent(obj.id));
    }

    /// Moves the player and, if given, the object it holds at its fixed
    /// offset. Callers validate both destinations first; both legs are
    /// applied together.
    pub fn move_player(
        &mut self,
        player: &mut GameObject,
        held: Option<(&mut GameObject, Coord)>,
        new_coord: Coord,
    ) {
        if let Some((obj, offset)) = held {
            self.move_obj(obj, new_coord + offset);
        }
        self.move_obj(player, new_coord);
    }

    /// Objects at a unit grouped by kind
    pub fn query(&self, coord: Coord) -> Option<&CellContents> {
        self.cells.get(&coord)
    }

    /// Every object at a unit, ordered by kind then id
    pub fn objs_at(&self, coord: Coord) -> impl Iterator<Item = (ObjKind, ObjId)> + '_ {
        self.cells
            .get(&coord)
            .into_iter()
            .flat_map(|kinds| kinds.iter().flat_map(|(k, ids)| ids.iter().map(move |id| (*k, *id))))
    }

    /// Number of non-player objects at a unit
    pub fn count_nonplayer(&self, coord: Coord) -> usize {
        self.cells
            .get(&coord)
            .map(|kinds| {
                kinds
                    .iter()
                    .filter(|(k, _)| !k.is_player())
                    .map(|(_, ids)| ids.len())
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Units the index lists the object under
    pub fn cells_of(&self, id: ObjId) -> AHashSet<Coord> {
        self.cells
            .iter()
            .filter(|(_, kinds)| kinds.values().any(|ids| ids.contains(&id)))
            .map(|(c, _)| *c)
            .collect()
    }

    /// True if the two objects' footprints share at least one unit
    pub fn are_overlapping(&self, a: ObjId, b: ObjId) -> bool {
        match (self.placements.get(&a), self.placements.get(&b)) {
            (Some(pa), Some(pb)) => rects_intersect(pa.coord, pa.size, pb.coord, pb.size),
            _ => false,
        }
    }

    /// Ids of every object overlapping the rectangle, in id order
    pub fn overlapping(&self, coord: Coord, size: Size) -> BTreeSet<ObjId> {
        Grid::footprint(coord, size)
            .flat_map(|cell| self.objs_at(cell).map(|(_, id)| id))
            .collect()
    }

    /// Full check of the footprint invariant over every indexed object
    pub fn check_invariant(&self) -> bool {
        let listed_ok = self.cells.iter().all(|(cell, kinds)| {
            !kinds.is_empty()
                && kinds.iter().all(|(kind, ids)| {
                    !ids.is_empty()
                        && ids.iter().all(|id| {
                            self.placements.get(id).is_some_and(|p| {
                                p.kind == *kind && rect_contains(p.coord, p.size, *cell)
                            })
                        })
                })
        });
        listed_ok && self.placements.keys().all(|id| self.is_consistent(*id))
    }

    /// True if the object is listed under exactly its footprint
    fn is_consistent(&self, id: ObjId) -> bool {
        let Some(p) = self.placements.get(&id) else {
            return true;
        };
        let covered = Grid::footprint(p.coord, p.size).all(|cell| {
            self.cells
                .get(&cell)
                .and_then(|kinds| kinds.get(&p.kind))
                .is_some_and(|ids| ids.contains(&id))
        });
        covered && self.cells_of(id).len() == p.size.area()
    }

    fn insert_at(&mut self, cell: Coord, kind: ObjKind, id: ObjId) {
        self.cells
            .entry(cell)
            .or_default()
            .entry(kind)
            .or_default()
            .insert(id);
    }

    fn erase_at(&mut self, cell: Coord, kind: ObjKind, id: ObjId) {
        if let Some(kinds) = self.cells.get_mut(&cell) {
            if let Some(ids) = kinds.get_mut(&kind) {
                ids.remove(&id);
                if ids.is_empty() {
                    kinds.remove(&kind);
                }
            }
            if kinds.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }
}

fn rect_contains(coord: Coord, size: Size, cell: Coord) -> bool {
    cell.row >= coord.row
        && cell.row < coord.row + size.rows
        && cell.col >= coord.col
        && cell.col < coord.col + size.cols
}

fn rects_intersect(a: Coord, a_size: Size, b: Coord, b_size: Size) -> bool {
    a.row < b.row + b_size.rows
        && b.row < a.row + a_size.rows
        && a.col < b.col + b_size.cols
        && b.col < a.col + a_size.cols
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::denomination::Denom;

    fn block(id: u32, denom: Denom, coord: Coord) -> GameObject {
        GameObject::new(ObjId(id), ObjKind::Block(denom), coord)
    }

    #[test]
    fn test_add_indexes_full_footprint() {
        let mut index = SpatialIndex::new();
        let mut obj = block(0, Denom::Fifty, Coord::new(1, 1));
        index.add(&mut obj, None);
        let cells = index.cells_of(obj.id);
        assert_eq!(cells, Grid::all_coords(Coord::new(1, 1), Size::new(10, 5)));
        assert!(index.check_invariant());
    }

    #[test]
    fn test_add_twice_moves() {
        let mut index = SpatialIndex::new();
        let mut obj = block(0, Denom::Five, Coord::new(0, 0));
        index.add(&mut obj, None);
        index.add(&mut obj, Some(Coord::new(0, 3)));
        assert_eq!(obj.coord, Coord::new(0, 3));
        assert_eq!(index.len(), 1);
        assert_eq!(index.count_nonplayer(Coord::new(0, 0)), 0);
        assert_eq!(index.count_nonplayer(Coord::new(4, 3)), 1);
        assert!(index.check_invariant());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut index = SpatialIndex::new();
        let mut obj = block(0, Denom::Ten, Coord::new(2, 2));
        index.add(&mut obj, None);
        assert!(index.remove(obj.id));
        assert!(!index.remove(obj.id));
        assert!(index.cells_of(obj.id).is_empty());
        assert!(index.query(Coord::new(2, 2)).is_none());
        assert!(index.check_invariant());
    }

    #[test]
    fn test_partial_overlap_move() {
        let mut index = SpatialIndex::new();
        let mut obj = block(0, Denom::Ten, Coord::new(0, 0));
        index.add(&mut obj, None);
        // Shift down by 3: rows 0..2 leave, rows 10..12 enter
        index.move_obj(&mut obj, Coord::new(3, 0));
        assert_eq!(index.cells_of(obj.id), Grid::all_coords(Coord::new(3, 0), Size::new(10, 1)));
        assert_eq!(index.coord_of(obj.id), Some(Coord::new(3, 0)));
        assert!(index.check_invariant());
    }

    #[test]
    fn test_move_unindexed_is_noop() {
        let mut index = SpatialIndex::new();
        let mut obj = block(0, Denom::One, Coord::new(0, 0));
        index.move_obj(&mut obj, Coord::new(1, 1));
        assert_eq!(obj.coord, Coord::new(0, 0));
        assert!(index.is_empty());
    }

    #[test]
    fn test_move_player_carries_held() {
        let mut index = SpatialIndex::new();
        let mut player = GameObject::new(ObjId(0), ObjKind::Player, Coord::new(2, 2));
        let mut held = block(1, Denom::One, Coord::new(1, 2));
        index.add(&mut player, None);
        index.add(&mut held, None);
        let offset = held.coord - player.coord;
        index.move_player(&mut player, Some((&mut held, offset)), Coord::new(2, 3));
        assert_eq!(player.coord, Coord::new(2, 3));
        assert_eq!(held.coord, Coord::new(1, 3));
        assert!(index.check_invariant());
    }

    #[test]
    fn test_query_groups_by_kind() {
        let mut index = SpatialIndex::new();
        let mut player = GameObject::new(ObjId(0), ObjKind::Player, Coord::new(0, 0));
        let mut a = block(1, Denom::One, Coord::new(0, 0));
        let mut b = block(2, Denom::One, Coord::new(0, 0));
        index.add(&mut player, None);
        index.add(&mut a, None);
        index.add(&mut b, None);
        let cell = index.query(Coord::new(0, 0)).unwrap();
        assert_eq!(cell[&ObjKind::Block(Denom::One)].len(), 2);
        assert_eq!(cell[&ObjKind::Player].len(), 1);
        assert_eq!(index.count_nonplayer(Coord::new(0, 0)), 2);
    }

    #[test]
    fn test_are_overlapping() {
        let mut index = SpatialIndex::new();
        let mut a = block(0, Denom::Five, Coord::new(0, 0));
        let mut b = block(1, Denom::One, Coord::new(4, 0));
        let mut c = block(2, Denom::One, Coord::new(5, 0));
        index.add(&mut a, None);
        index.add(&mut b, None);
        index.add(&mut c, None);
        assert!(index.are_overlapping(a.id, b.id));
        assert!(!index.are_overlapping(a.id, c.id));
        assert!(!index.are_overlapping(a.id, ObjId(9)));
        assert_eq!(
            index.overlapping(Coord::new(3, 0), Size::new(3, 1)),
            [a.id, b.id, c.id].into_iter().collect()
        );
    }
}
