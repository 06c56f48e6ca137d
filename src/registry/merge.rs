//! Merging same-value blocks and decomposing blocks into smaller ones.
//! Both conserve the total block value.

use super::Registry;
use crate::core::types::{Coord, ObjId, Size};
use crate::world::denomination::Denom;
use crate::world::objects::ObjKind;
use tracing::debug;

impl Registry {
    /// Merges blocks anchored exactly at `coord`, denomination by
    /// denomination from the smallest up. Whenever enough blocks of one
    /// value sit there to make the next denomination, the lowest-id ones
    /// are replaced by a single larger block, which can cascade upward
    /// within the same call. A merged block that would leave the playable
    /// area at `coord` goes to the nearest free spot instead; with no
    /// such spot that merge is skipped. Returns true if anything merged.
    pub fn attempt_merge(&mut self, coord: Coord) -> bool {
        let mut merged = false;
        for denom in Denom::ALL {
            let (Some(up), Some(ratio)) = (denom.next_up(), denom.merge_ratio()) else {
                continue;
            };
            loop {
                let stack = self.blocks_anchored_at(coord, denom);
                if stack.len() < ratio as usize {
                    break;
                }
                let Some(dest) = self.merge_destination(coord, up.block_size()) else {
                    debug!(?coord, to = ?up, "no room for merged block");
                    break;
                };
                for id in &stack[..ratio as usize] {
                    self.delete_obj(*id);
                }
                let new = self.make_block(up, dest);
                debug!(?coord, ?dest, from = ?denom, to = ?up, id = new.0, "merged blocks");
                merged = true;
            }
        }
        merged
    }

    /// Replaces `ids` with one block of `target_value` at the lowest id's
    /// anchor, or the nearest free spot if it would not be playable there.
    /// Does nothing unless `target_value` is a denomination, every id is a
    /// distinct player-made block, their values sum to it and there is
    /// room for the result.
    pub fn merge(&mut self, ids: &[ObjId], target_value: u32) -> Option<ObjId> {
        let target = Denom::from_value(target_value)?;
        let mut sorted: Vec<ObjId> = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() < 2 || sorted.len() != ids.len() {
            return None;
        }
        if !sorted.iter().all(|id| self.blocks.contains(id)) {
            return None;
        }
        let sum: u32 = sorted
            .iter()
            .filter_map(|id| self.objects.get(*id))
            .map(|o| o.value())
            .sum();
        if sum != target_value {
            return None;
        }

        let anchor = self.objects.get(sorted[0])?.coord;
        let dest = self.merge_destination(anchor, target.block_size())?;
        for id in &sorted {
            self.delete_obj(*id);
        }
        let new = self.make_block(target, dest);
        debug!(n = sorted.len(), value = target_value, id = new.0, "merged blocks by request");
        Some(new)
    }

    /// Splits a player-made block into the fixed layout of smaller
    /// blocks covering its footprint. Returns false for unit blocks and
    /// anything that is not a player-made block.
    pub fn decompose_obj(&mut self, id: ObjId) -> bool {
        if !self.blocks.contains(&id) {
            return false;
        }
        let Some((denom, anchor)) = self
            .objects
            .get(id)
            .and_then(|o| o.block_denom().map(|d| (d, o.coord)))
        else {
            return false;
        };
        let pieces = denom.decomposition();
        if pieces.is_empty() {
            return false;
        }
        self.delete_obj(id);
        for (piece, offset) in &pieces {
            self.make_block(*piece, anchor + *offset);
        }
        debug!(?denom, ?anchor, n = pieces.len(), "decomposed block");
        true
    }

    /// Decomposes the held block and leaves the player empty-handed. No-op
    /// returning false when not holding or holding a unit block; the
    /// player keeps the block in that case.
    pub fn handle_decomp(&mut self) -> bool {
        let Some(id) = self.player.held_obj() else {
            return false;
        };
        let decomposable = self
            .objects
            .get(id)
            .and_then(|o| o.block_denom())
            .is_some_and(|d| d != Denom::SMALLEST);
        if !decomposable {
            return false;
        }
        self.player.drop_held();
        self.decompose_obj(id)
    }

    /// Where a merged block of `size` goes: its anchor when playable there,
    /// otherwise the ring search's pick
    fn merge_destination(&self, anchor: Coord, size: Size) -> Option<Coord> {
        if self.grid.is_playable(anchor, size) {
            Some(anchor)
        } else {
            self.search_space(anchor, size, None)
        }
    }

    /// Player-made blocks of one value anchored exactly at `coord`,
    /// lowest id first. The held block is never included.
    fn blocks_anchored_at(&self, coord: Coord, denom: Denom) -> Vec<ObjId> {
        let held = self.player.held_obj();
        self.index
            .query(coord)
            .and_then(|kinds| kinds.get(&ObjKind::Block(denom)))
            .into_iter()
            .flatten()
            .copied()
            .filter(|id| Some(*id) != held && self.blocks.contains(id))
            .filter(|id| self.objects.get(*id).is_some_and(|o| o.coord == coord))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::undivided;
    use super::*;
    use crate::core::config::GameConfig;
    use crate::core::types::Direction;

    fn divided(rows: i32, cols: i32) -> Registry {
        let mut config = GameConfig::default();
        config.grid.rows = rows;
        config.grid.cols = cols;
        Registry::new(config).unwrap()
    }

    fn all_blocks_playable(reg: &Registry) -> bool {
        reg.blocks().all(|b| reg.grid().is_playable(b.coord, b.size))
    }

    #[test]
    fn test_four_ones_do_not_merge() {
        let mut reg = undivided(5, 5);
        for _ in 0..4 {
            reg.make_block(Denom::One, Coord::new(2, 2));
        }
        assert!(!reg.attempt_merge(Coord::new(2, 2)));
        assert_eq!(reg.n_blocks(), 4);
    }

    #[test]
    fn test_five_ones_make_a_five() {
        let mut reg = undivided(10, 5);
        for _ in 0..5 {
            reg.make_block(Denom::One, Coord::new(2, 2));
        }
        assert!(reg.attempt_merge(Coord::new(2, 2)));
        assert_eq!(reg.n_blocks(), 1);
        let block = reg.blocks().next().unwrap();
        assert_eq!(block.value(), 5);
        assert_eq!(block.coord, Coord::new(2, 2));
        assert!(!reg.attempt_merge(Coord::new(2, 2)));
    }

    #[test]
    fn test_merge_cascades() {
        let mut reg = undivided(20, 5);
        reg.make_block(Denom::Five, Coord::new(0, 0));
        for _ in 0..6 {
            reg.make_block(Denom::One, Coord::new(0, 0));
        }
        assert!(reg.attempt_merge(Coord::new(0, 0)));
        // 6 ones -> five + one; two fives -> ten
        assert_eq!(reg.block_sum(), 11);
        assert_eq!(reg.block_counts()[&Denom::Ten], 1);
        assert_eq!(reg.block_counts()[&Denom::One], 1);
        assert_eq!(reg.n_blocks(), 2);
        assert!(reg.index().check_invariant());
    }

    #[test]
    fn test_merge_ignores_other_anchors() {
        let mut reg = undivided(10, 5);
        for _ in 0..4 {
            reg.make_block(Denom::One, Coord::new(1, 1));
        }
        reg.make_block(Denom::One, Coord::new(1, 2));
        assert!(!reg.attempt_merge(Coord::new(1, 1)));
        assert_eq!(reg.n_blocks(), 5);
    }

    #[test]
    fn test_explicit_merge() {
        let mut reg = undivided(20, 10);
        let a = reg.make_block(Denom::Fifty, Coord::new(0, 0));
        let b = reg.make_block(Denom::Fifty, Coord::new(0, 5));
        let merged = reg.merge(&[b, a], 100).unwrap();
        assert_eq!(reg.obj(merged).unwrap().coord, Coord::new(0, 0));
        assert_eq!(reg.obj(merged).unwrap().value(), 100);
        assert_eq!(reg.n_blocks(), 1);
    }

    #[test]
    fn test_explicit_merge_rejects_bad_requests() {
        let mut reg = undivided(20, 10);
        let a = reg.make_block(Denom::Ten, Coord::new(0, 0));
        let b = reg.make_block(Denom::Five, Coord::new(0, 1));
        assert_eq!(reg.merge(&[a, b], 15), None);
        assert_eq!(reg.merge(&[a, b], 10), None);
        assert_eq!(reg.merge(&[a, a], 20), None);
        assert_eq!(reg.merge(&[a], 10), None);
        assert_eq!(reg.n_blocks(), 2);
    }

    #[test]
    fn test_decompose_obj_conserves_value() {
        for denom in [Denom::Five, Denom::Ten, Denom::Fifty, Denom::Hundred] {
            let mut reg = undivided(20, 5);
            let id = reg.make_block(denom, Coord::new(0, 0));
            assert!(reg.decompose_obj(id));
            assert!(reg.obj(id).is_none());
            assert_eq!(reg.block_sum(), denom.value());
            assert_eq!(reg.n_blocks(), denom.decomposition().len());
            assert!(reg.index().check_invariant());
        }
    }

    #[test]
    fn test_decompose_unit_block_is_noop() {
        let mut reg = undivided(5, 5);
        let id = reg.make_block(Denom::One, Coord::new(0, 0));
        assert!(!reg.decompose_obj(id));
        assert!(reg.obj(id).is_some());
    }

    #[test]
    fn test_handle_decomp() {
        let mut reg = undivided(10, 5);
        assert!(!reg.handle_decomp());

        reg.make_block(Denom::Ten, Coord::new(0, 0));
        reg.step(Direction::Stay, true);
        assert!(reg.handle_decomp());
        assert!(!reg.player().is_holding());
        assert_eq!(reg.block_counts()[&Denom::Five], 2);
        assert_eq!(reg.block_sum(), 10);
    }

    #[test]
    fn test_handle_decomp_keeps_unit_block() {
        let mut reg = undivided(5, 5);
        let id = reg.make_block(Denom::One, Coord::new(0, 0));
        reg.step(Direction::Stay, true);
        assert!(!reg.handle_decomp());
        assert_eq!(reg.player().held_obj(), Some(id));
    }

    #[test]
    fn test_merge_on_last_playable_row_stays_in_half() {
        // Rows 0..=4 are playable, row 5 is the divider
        let mut reg = divided(11, 11);
        for _ in 0..5 {
            reg.make_block(Denom::One, Coord::new(4, 1));
        }
        assert!(reg.attempt_merge(Coord::new(4, 1)));
        assert_eq!(reg.n_blocks(), 1);
        let five = reg.blocks().next().unwrap();
        assert_eq!(five.value(), 5);
        assert_eq!(five.coord, Coord::new(0, 0));
        assert!(all_blocks_playable(&reg));
        assert!(reg.index().check_invariant());
    }

    #[test]
    fn test_merge_at_grid_edge_stays_on_grid() {
        let mut reg = undivided(5, 5);
        for _ in 0..5 {
            reg.make_block(Denom::One, Coord::new(4, 4));
        }
        assert!(reg.attempt_merge(Coord::new(4, 4)));
        let five = reg.blocks().next().unwrap();
        assert_eq!(five.coord, Coord::new(0, 0));
        assert!(reg.grid().is_inbounds(five.coord, five.size));
        assert_eq!(reg.block_sum(), 5);
    }

    #[test]
    fn test_merge_skipped_without_room() {
        // A five is taller than the whole grid
        let mut reg = undivided(4, 4);
        for _ in 0..5 {
            reg.make_block(Denom::One, Coord::new(1, 1));
        }
        assert!(!reg.attempt_merge(Coord::new(1, 1)));
        assert_eq!(reg.n_blocks(), 5);
        assert_eq!(reg.block_counts()[&Denom::One], 5);
    }

    #[test]
    fn test_explicit_merge_rehomes_unplayable_result() {
        let mut reg = divided(21, 11);
        let a = reg.make_block(Denom::Five, Coord::new(5, 0));
        let b = reg.make_block(Denom::Five, Coord::new(0, 4));
        let ten = reg.merge(&[a, b], 10).unwrap();
        let ten = reg.obj(ten).unwrap();
        assert!(reg.grid().is_playable(ten.coord, ten.size));
        assert_eq!(reg.block_sum(), 10);
    }

    #[test]
    fn test_explicit_merge_without_room_keeps_blocks() {
        let mut reg = divided(11, 11);
        let a = reg.make_block(Denom::Five, Coord::new(0, 0));
        let b = reg.make_block(Denom::Five, Coord::new(0, 1));
        // A ten needs 10 playable rows; this half has 5
        assert_eq!(reg.merge(&[a, b], 10), None);
        assert_eq!(reg.n_blocks(), 2);
    }

    #[test]
    fn test_decompose_next_to_divider() {
        // Rows 0..=9 are playable, row 10 is the divider
        let mut reg = divided(21, 11);
        let ten = reg.make_block(Denom::Ten, Coord::new(0, 3));
        let fifty = reg.make_block(Denom::Fifty, Coord::new(0, 6));
        assert!(reg.decompose_obj(ten));
        assert!(reg.decompose_obj(fifty));
        assert_eq!(reg.block_sum(), 60);
        assert_eq!(reg.block_counts()[&Denom::Five], 2);
        assert_eq!(reg.block_counts()[&Denom::Ten], 5);
        assert!(all_blocks_playable(&reg));
        assert!(reg.index().check_invariant());
    }
}
