#![forbid(unsafe_code)]

/**
 * Property tests for the registry's spatial bookkeeping.
 *
 * Invariants covered:
 * - Every object is listed under exactly the units its footprint covers.
 * - A held object keeps its grab offset from the player across moves.
 * - Deleted objects leave no trace in the index.
 * - Merging and decomposing conserve the total block value.
 * - The ring search returns the first qualifying anchor in scan order.
 */
use gridworld::spatial::grid::Grid;
use gridworld::{Coord, Denom, Direction, GameConfig, GridConfig, ObjKind, Registry, Size};
use proptest::prelude::*;
use std::collections::HashSet;

fn undivided(rows: i32, cols: i32) -> Registry {
    let mut config = GameConfig::default();
    config.grid = GridConfig {
        rows,
        cols,
        divided: false,
        ..GridConfig::default()
    };
    Registry::new(config).unwrap()
}

fn assert_footprints_indexed(reg: &Registry) {
    assert!(reg.index().check_invariant());
    for obj in reg.objects().iter() {
        let expected = Grid::all_coords(obj.coord, obj.size);
        assert_eq!(reg.index().cells_of(obj.id), expected, "object {:?}", obj.id);
    }
}

fn assert_carry_offset(reg: &Registry) {
    if let Some(held) = reg.player().held {
        let obj = reg.obj(held.obj).expect("held object must exist");
        assert_eq!(obj.coord, reg.player_coord() + held.offset);
    }
}

const SMALL_DENOMS: [Denom; 3] = [Denom::One, Denom::Five, Denom::Ten];

/// Anchor order of the ring search around `centre`, for any anchor
/// outside the centre: ring layer, then top/bottom/left/right edge, then
/// position along the edge
fn scan_key(centre: Coord, c: Coord) -> (i32, u8, i32) {
    let (dr, dc) = (c.row - centre.row, c.col - centre.col);
    let layer = dr.abs().max(dc.abs());
    if dr == -layer {
        (layer, 0, c.col)
    } else if dr == layer {
        (layer, 1, c.col)
    } else if dc == -layer {
        (layer, 2, c.row)
    } else {
        (layer, 3, c.row)
    }
}

proptest! {
    #[test]
    fn random_rollout_keeps_index_consistent(
        blocks in prop::collection::vec((0usize..3, 0i32..14, 0i32..8), 0..12),
        actions in prop::collection::vec((0usize..5, any::<bool>()), 1..120),
    ) {
        let mut reg = undivided(24, 8);
        reg.make_object(ObjKind::Pile(Denom::One), Coord::new(0, 0));
        reg.make_object(ObjKind::Pile(Denom::Five), Coord::new(0, 3));
        for (d, row, col) in &blocks {
            reg.make_block(SMALL_DENOMS[*d], Coord::new(*row, *col));
        }
        assert_footprints_indexed(&reg);

        for (dir, grab) in actions {
            let before = reg.player().held;
            reg.step(Direction::from_index(dir), grab);
            assert_footprints_indexed(&reg);
            assert_carry_offset(&reg);
            if let (Some(a), Some(b)) = (before, reg.player().held) {
                prop_assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn deleted_objects_leave_no_trace(
        blocks in prop::collection::vec((0usize..3, 0i32..14, 0i32..8), 1..16),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..8),
    ) {
        let mut reg = undivided(24, 8);
        let ids: Vec<_> = blocks
            .iter()
            .map(|(d, row, col)| reg.make_block(SMALL_DENOMS[*d], Coord::new(*row, *col)))
            .collect();

        let mut deleted = HashSet::new();
        for pick in picks {
            let id = ids[pick.index(ids.len())];
            let removed = reg.delete_obj(id);
            prop_assert_eq!(removed, deleted.insert(id));
            prop_assert!(reg.obj(id).is_none());
            prop_assert!(!reg.index().contains(id));
            prop_assert!(reg.index().cells_of(id).is_empty());
        }
        prop_assert_eq!(reg.n_blocks(), ids.len() - deleted.len());
        assert_footprints_indexed(&reg);
    }

    #[test]
    fn merging_conserves_value(ones in 1u32..40, fives in 0u32..6) {
        let mut reg = undivided(40, 10);
        let at = Coord::new(3, 2);
        for _ in 0..fives {
            reg.make_block(Denom::Five, at);
        }
        for _ in 0..ones {
            reg.make_block(Denom::One, at);
        }
        let total = ones + 5 * fives;
        reg.attempt_merge(at);

        prop_assert_eq!(reg.block_sum(), total);
        let counts = reg.block_counts();
        prop_assert!(counts[&Denom::One] < 5);
        prop_assert!(counts[&Denom::Five] < 2);
        assert_footprints_indexed(&reg);
    }

    #[test]
    fn decomposing_conserves_value(d in 1usize..5, row in 0i32..5, col in 0i32..5) {
        let denom = Denom::ALL[d];
        let mut reg = undivided(40, 10);
        let id = reg.make_block(denom, Coord::new(row, col));
        let footprint = Grid::all_coords(Coord::new(row, col), denom.block_size());

        prop_assert!(reg.decompose_obj(id));
        prop_assert_eq!(reg.block_sum(), denom.value());

        // Pieces tile the original footprint without overlapping
        let mut covered = HashSet::new();
        for piece in reg.blocks() {
            for cell in Grid::footprint(piece.coord, piece.size) {
                prop_assert!(footprint.contains(&cell));
                prop_assert!(covered.insert(cell));
            }
        }
        prop_assert_eq!(covered.len(), footprint.len());
        assert_footprints_indexed(&reg);
    }

    #[test]
    fn ring_search_matches_brute_force(
        rows in 3i32..10,
        cols in 3i32..10,
        taken in prop::collection::vec((0i32..10, 0i32..10), 0..40),
        centre in (0i32..10, 0i32..10),
        shape in 0usize..4,
    ) {
        let size = [Size::UNIT, Size::new(1, 2), Size::new(2, 1), Size::new(5, 1)][shape];
        let mut reg = undivided(rows, cols);
        let mut occupied = HashSet::new();
        for (r, c) in taken {
            let coord = Coord::new(r % rows, c % cols);
            reg.make_block(Denom::One, coord);
            occupied.insert(coord);
        }
        let centre = Coord::new(centre.0 % rows, centre.1 % cols);

        let expected = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| Coord::new(r, c)))
            .filter(|c| *c != centre)
            .filter(|c| c.row + size.rows <= rows && c.col + size.cols <= cols)
            .filter(|c| Grid::footprint(*c, size).all(|cell| !occupied.contains(&cell)))
            .min_by_key(|c| scan_key(centre, *c));

        prop_assert_eq!(reg.search_space(centre, size, None), expected);
    }
}
