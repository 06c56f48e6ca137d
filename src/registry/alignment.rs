//! Read-only line queries over blocks and targets, used by policies that
//! try to line one block up under each target.

use super::Registry;
use crate::core::types::{Coord, ObjId};
use crate::world::objects::GameObject;
use std::collections::{BTreeMap, BTreeSet};

/// Row the goal line defaults to before any block is aligned, counted
/// from the top playable row
const DEFAULT_GOAL_ROW: i32 = 2;

/// How many objects are anchored on each row and each column
pub fn row_col_counts<'a>(
    objs: impl IntoIterator<Item = &'a GameObject>,
) -> (BTreeMap<i32, usize>, BTreeMap<i32, usize>) {
    let mut rows = BTreeMap::new();
    let mut cols = BTreeMap::new();
    for obj in objs {
        *rows.entry(obj.coord.row).or_insert(0) += 1;
        *cols.entry(obj.coord.col).or_insert(0) += 1;
    }
    (rows, cols)
}

/// The row holding the most objects, ignoring rows above `min_row`.
/// The earliest row wins a tie. Returns the row and its count.
pub fn max_row<'a>(
    objs: impl IntoIterator<Item = &'a GameObject>,
    min_row: Option<i32>,
) -> Option<(i32, usize)> {
    let (rows, _) = row_col_counts(objs);
    rows.into_iter()
        .filter(|(row, _)| min_row.map_or(true, |m| *row >= m))
        .fold(None, |best, (row, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((row, count)),
        })
}

/// Items that are not part of the line: those with no target in their
/// column, those off the busiest row, and all but one of any items
/// sharing an anchor
pub fn unaligned_items(
    items: &[&GameObject],
    targs: &[&GameObject],
    min_row: Option<i32>,
) -> BTreeSet<ObjId> {
    let line_row = max_row(items.iter().copied(), min_row).map(|(row, _)| row);
    let (_, targ_cols) = row_col_counts(targs.iter().copied());

    let mut per_coord: BTreeMap<Coord, usize> = BTreeMap::new();
    for item in items {
        *per_coord.entry(item.coord).or_insert(0) += 1;
    }

    let mut sorted: Vec<&GameObject> = items.to_vec();
    sorted.sort_by_key(|o| o.id);
    let mut loners = BTreeSet::new();
    for item in sorted {
        let stacked = per_coord.get_mut(&item.coord);
        if !targ_cols.contains_key(&item.coord.col) || Some(item.coord.row) != line_row {
            loners.insert(item.id);
        } else if let Some(n) = stacked.filter(|n| **n > 1) {
            *n -= 1;
            loners.insert(item.id);
        }
    }
    loners
}

/// Items on the busiest row with a target in their column, one per unit
pub fn aligned_items(
    items: &[&GameObject],
    targs: &[&GameObject],
    min_row: Option<i32>,
) -> BTreeSet<ObjId> {
    let loners = unaligned_items(items, targs, min_row);
    items
        .iter()
        .map(|o| o.id)
        .filter(|id| !loners.contains(id))
        .collect()
}

/// The object whose anchor is closest to `reference`; the first one
/// wins a tie
pub fn nearest_obj<'a>(
    reference: Coord,
    objs: impl IntoIterator<Item = &'a GameObject>,
) -> Option<&'a GameObject> {
    objs.into_iter().fold(None::<&'a GameObject>, |best, obj| match best {
        Some(b) if b.coord.distance_sq(&reference) <= obj.coord.distance_sq(&reference) => Some(b),
        _ => Some(obj),
    })
}

/// Where the player should head to extend the line under the targets.
///
/// The goal column is that of the target nearest the player among those
/// without an aligned item. The goal row is the aligned items' row, or
/// `default_row` when nothing is aligned yet. Returns `None` once every
/// target is covered.
pub fn even_line_goal_coord(
    player: Coord,
    aligned: &[&GameObject],
    targs: &[&GameObject],
    default_row: i32,
) -> Option<Coord> {
    let uncovered_ids = unaligned_items(targs, aligned, None);
    let uncovered = targs.iter().copied().filter(|t| uncovered_ids.contains(&t.id));
    let goal = nearest_obj(player, uncovered)?;
    let row = aligned.first().map(|o| o.coord.row).unwrap_or(default_row);
    Some(Coord::new(row, goal.coord.col))
}

impl Registry {
    /// Highest row a line of blocks may form on, the same row the goal
    /// defaults to
    fn line_min_row(&self) -> i32 {
        self.playable_rows().0 + DEFAULT_GOAL_ROW
    }

    pub fn unaligned_items(&self) -> BTreeSet<ObjId> {
        let items: Vec<&GameObject> = self.blocks().collect();
        let targs: Vec<&GameObject> = self.targs().collect();
        unaligned_items(&items, &targs, Some(self.line_min_row()))
    }

    pub fn aligned_items(&self) -> BTreeSet<ObjId> {
        let items: Vec<&GameObject> = self.blocks().collect();
        let targs: Vec<&GameObject> = self.targs().collect();
        aligned_items(&items, &targs, Some(self.line_min_row()))
    }

    /// Goal for a policy building one block under each target. `None`
    /// means the line is complete.
    pub fn even_line_goal_coord(&self) -> Option<Coord> {
        let aligned_ids = self.aligned_items();
        let aligned: Vec<&GameObject> = self
            .blocks()
            .filter(|b| aligned_ids.contains(&b.id))
            .collect();
        let targs: Vec<&GameObject> = self.targs().collect();
        let (top, end) = self.playable_rows();
        let default_row = (top + DEFAULT_GOAL_ROW).clamp(top, (end - 1).max(top));
        even_line_goal_coord(self.player_coord(), &aligned, &targs, default_row)
    }
}
