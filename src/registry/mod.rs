//! Object registry: owns every object on the grid and mediates all
//! mutations so the spatial index never drifts from the object table.
//!
//! Behaviour is split by concern:
//! - [`movement`]: player movement, grab, drop and `step`
//! - [`merge`]: merging and decomposing blocks
//! - [`search`]: emptiness queries and free-space searches
//! - [`alignment`]: read-only line queries used by policies

pub mod alignment;
pub mod merge;
pub mod movement;
pub mod search;

use crate::core::config::{GameConfig, PlayableHalf, TargetLayout};
use crate::core::error::{GridError, Result};
use crate::core::types::{Coord, Event, ObjId, Size};
use crate::render;
use crate::spatial::grid::Grid;
use crate::spatial::index::SpatialIndex;
use crate::world::denomination::{val_to_denoms, Denom};
use crate::world::objects::{GameObject, ObjKind, ObjectTable, Operation, Player};
use crate::world::placement;
use ahash::AHashSet;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, warn};

/// Columns left blank between the parts of an equation
const EQUATION_GAP: i32 = 1;

type EventHandler = Box<dyn FnMut(Event)>;

pub struct Registry {
    config: GameConfig,
    grid: Grid,
    objects: ObjectTable,
    index: SpatialIndex,
    player: Player,
    button: Option<ObjId>,
    operator: Option<ObjId>,
    piles: BTreeSet<ObjId>,
    /// Blocks the player made and may interact with
    blocks: BTreeSet<ObjId>,
    targs: BTreeSet<ObjId>,
    /// Equation display blocks; never grabbable
    left_eqn: Vec<ObjId>,
    right_eqn: Vec<ObjId>,
    targ_val: u32,
    handlers: Vec<EventHandler>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("shape", &self.grid.shape())
            .field("objects", &self.objects.len())
            .field("player", &self.player)
            .field("n_blocks", &self.blocks.len())
            .field("n_targs", &self.targs.len())
            .field("targ_val", &self.targ_val)
            .finish()
    }
}

impl Registry {
    /// Builds an empty registry holding only the player, placed at the
    /// top-left of the playable area
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;
        let grid = Grid::new(&config.grid);
        let mut objects = ObjectTable::new();
        let mut index = SpatialIndex::new();

        let start = Coord::new(first_playable_row(&grid), 0);
        let player_id = objects.spawn(ObjKind::Player, start, Size::UNIT);
        if let Some(obj) = objects.get_mut(player_id) {
            index.add(obj, None);
        }

        let mut registry = Self {
            config,
            grid,
            objects,
            index,
            player: Player::new(player_id),
            button: None,
            operator: None,
            piles: BTreeSet::new(),
            blocks: BTreeSet::new(),
            targs: BTreeSet::new(),
            left_eqn: Vec::new(),
            right_eqn: Vec::new(),
            targ_val: 0,
            handlers: Vec::new(),
        };
        registry.draw_register();
        Ok(registry)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    pub fn obj(&self, id: ObjId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_coord(&self) -> Coord {
        self.objects
            .get(self.player.id)
            .map(|o| o.coord)
            .unwrap_or_default()
    }

    pub fn held_obj(&self) -> Option<&GameObject> {
        self.player.held_obj().and_then(|id| self.objects.get(id))
    }

    pub fn button(&self) -> Option<&GameObject> {
        self.button.and_then(|id| self.objects.get(id))
    }

    pub fn operator(&self) -> Option<&GameObject> {
        self.operator.and_then(|id| self.objects.get(id))
    }

    pub fn piles(&self) -> impl Iterator<Item = &GameObject> {
        self.piles.iter().filter_map(|id| self.objects.get(*id))
    }

    /// Player-made blocks in creation order
    pub fn blocks(&self) -> impl Iterator<Item = &GameObject> {
        self.blocks.iter().filter_map(|id| self.objects.get(*id))
    }

    pub fn block_ids(&self) -> impl Iterator<Item = ObjId> + '_ {
        self.blocks.iter().copied()
    }

    pub fn targs(&self) -> impl Iterator<Item = &GameObject> {
        self.targs.iter().filter_map(|id| self.objects.get(*id))
    }

    pub fn left_eqn(&self) -> impl Iterator<Item = &GameObject> {
        self.left_eqn.iter().filter_map(|id| self.objects.get(*id))
    }

    pub fn right_eqn(&self) -> impl Iterator<Item = &GameObject> {
        self.right_eqn.iter().filter_map(|id| self.objects.get(*id))
    }

    pub fn n_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Total value of the player-made blocks
    pub fn block_sum(&self) -> u32 {
        self.blocks().map(|b| b.value()).sum()
    }

    /// Player-made blocks per denomination; every denomination is present
    pub fn block_counts(&self) -> BTreeMap<Denom, usize> {
        let mut counts: BTreeMap<Denom, usize> = Denom::ALL.iter().map(|d| (*d, 0)).collect();
        for denom in self.blocks().filter_map(|b| b.block_denom()) {
            *counts.entry(denom).or_insert(0) += 1;
        }
        counts
    }

    pub fn n_targs(&self) -> usize {
        self.targs.len()
    }

    /// The value the player is asked to build
    pub fn targ_val(&self) -> u32 {
        self.targ_val
    }

    pub fn full_grid_penalty(&self) -> f32 {
        self.config.full_grid_penalty
    }

    /// First and one-past-last row of the player's area
    pub fn playable_rows(&self) -> (i32, i32) {
        let (rows, _) = self.grid.shape();
        if !self.grid.is_divided() {
            return (0, rows);
        }
        match self.grid.playable_half() {
            PlayableHalf::Upper => (0, self.grid.middle_row()),
            PlayableHalf::Lower => (self.grid.middle_row() + 1, rows),
        }
    }

    // ------------------------------------------------------------------
    // Object lifecycle
    // ------------------------------------------------------------------

    /// Registers a new object of the given kind and size in the object
    /// table, the spatial index and its typed collection.
    ///
    /// The player is a singleton: asking for another one repositions the
    /// existing player instead.
    pub fn add_obj(&mut self, kind: ObjKind, coord: Coord, size: Size) -> ObjId {
        if kind.is_player() {
            self.place_player(coord);
            return self.player.id;
        }
        let id = self.objects.spawn(kind, coord, size);
        if let Some(obj) = self.objects.get_mut(id) {
            self.index.add(obj, None);
        }
        match kind {
            ObjKind::Block(_) => {
                self.blocks.insert(id);
            }
            ObjKind::Pile(_) => {
                self.piles.insert(id);
            }
            ObjKind::Target => {
                self.targs.insert(id);
            }
            ObjKind::Button => {
                if let Some(old) = self.button.replace(id) {
                    self.delete_obj(old);
                }
            }
            ObjKind::Operator(_) => {
                if let Some(old) = self.operator.replace(id) {
                    self.delete_obj(old);
                }
            }
            ObjKind::Marker | ObjKind::Divider | ObjKind::Player => {}
        }
        id
    }

    /// `add_obj` with the kind's default size
    pub fn make_object(&mut self, kind: ObjKind, coord: Coord) -> ObjId {
        self.add_obj(kind, coord, kind.default_size())
    }

    pub fn make_block(&mut self, denom: Denom, coord: Coord) -> ObjId {
        self.make_object(ObjKind::Block(denom), coord)
    }

    /// Removes an object from every structure and erases it from the
    /// rendered buffer. The player can't be deleted. Releases the object
    /// if the player was holding it.
    pub fn delete_obj(&mut self, id: ObjId) -> bool {
        if id == self.player.id {
            return false;
        }
        let Some(obj) = self.objects.remove(id) else {
            return false;
        };
        if self.player.held_obj() == Some(id) {
            self.player.drop_held();
        }
        render::erase_obj(&mut self.grid, &obj);
        self.index.remove(id);
        self.blocks.remove(&id);
        self.piles.remove(&id);
        self.targs.remove(&id);
        self.left_eqn.retain(|e| *e != id);
        self.right_eqn.retain(|e| *e != id);
        if self.button == Some(id) {
            self.button = None;
        }
        if self.operator == Some(id) {
            self.operator = None;
        }
        true
    }

    /// Deletes every player-made block
    pub fn clear_blocks(&mut self) {
        let ids: Vec<ObjId> = self.blocks.iter().copied().collect();
        for id in ids {
            self.delete_obj(id);
        }
    }

    fn clear_targs(&mut self) {
        let ids: Vec<ObjId> = self.targs.iter().copied().collect();
        for id in ids {
            self.delete_obj(id);
        }
    }

    fn clear_equation(&mut self) {
        let ids: Vec<ObjId> = self.left_eqn.iter().chain(&self.right_eqn).copied().collect();
        for id in ids {
            self.delete_obj(id);
        }
        if let Some(op) = self.operator {
            self.delete_obj(op);
        }
    }

    /// Repositions any object if its footprint stays on the grid. The
    /// player is routed through the carrying move and must stay playable.
    /// The held object only moves with the player, so it is refused here.
    pub fn move_obj(&mut self, id: ObjId, coord: Coord) -> bool {
        if id == self.player.id {
            return self.place_player(coord);
        }
        if self.player.held_obj() == Some(id) {
            return false;
        }
        let Some(obj) = self.objects.get_mut(id) else {
            return false;
        };
        if !self.grid.is_inbounds(coord, obj.size) {
            return false;
        }
        self.index.move_obj(obj, coord);
        true
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Registers a callback run whenever a terminal event is raised
    pub fn on_event(&mut self, handler: impl FnMut(Event) + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub(crate) fn raise(&mut self, event: Event) {
        match event {
            Event::Full => warn!(penalty = self.config.full_grid_penalty, "grid full"),
            Event::ButtonPress => debug!("button pressed"),
            Event::Step => {}
        }
        for handler in self.handlers.iter_mut() {
            handler(event);
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Redraws the whole buffer from the current object state
    pub fn draw_register(&mut self) {
        render::draw_register(&mut self.grid, &mut self.objects);
    }

    /// Redraws only objects that moved or appeared since the last draw
    pub fn draw_register_changes(&mut self) {
        render::draw_register_changes(&mut self.grid, &mut self.objects);
    }

    // ------------------------------------------------------------------
    // Episode reset
    // ------------------------------------------------------------------

    /// Sets up an arithmetic episode: the equation `left op right` is laid
    /// out in the non-playable half, one pile per denomination plus the
    /// button and the player go on random distinct columns of the top
    /// playable row, and the target value becomes the result.
    pub fn reset_equation<R: Rng>(
        &mut self,
        left: u32,
        op: Operation,
        right: u32,
        rng: &mut R,
    ) -> Result<()> {
        let left_denoms = val_to_denoms(left);
        let right_denoms = val_to_denoms(right);
        self.check_equation_fits(&left_denoms, op, &right_denoms)?;
        self.check_top_row_fits(Denom::ALL.len())?;

        self.clear_blocks();
        self.clear_targs();
        self.clear_equation();
        self.ensure_piles(&Denom::ALL);
        self.place_top_row(rng)?;

        let (row, _) = self.grid.nonplay_rows();
        let mut min_col = 0;
        for denom in left_denoms {
            let (id, next) = self.place_on_row(ObjKind::Block(denom), row, min_col)?;
            self.blocks.remove(&id);
            self.left_eqn.push(id);
            min_col = next;
        }
        let (_, next) = self.place_on_row(ObjKind::Operator(op), row, min_col + EQUATION_GAP)?;
        min_col = next + EQUATION_GAP;
        for denom in right_denoms {
            let (id, next) = self.place_on_row(ObjKind::Block(denom), row, min_col)?;
            self.blocks.remove(&id);
            self.right_eqn.push(id);
            min_col = next;
        }

        self.targ_val = op.apply(left, right);
        debug!(left, right, ?op, targ_val = self.targ_val, "equation reset");
        self.grid.reset();
        self.draw_register();
        Ok(())
    }

    /// Sets up a counting episode: `n` targets in the non-playable half
    /// using `layout`, a single unit pile, the button and the player on
    /// the top playable row. The target value becomes `n`.
    pub fn reset_targets<R: Rng>(
        &mut self,
        n: usize,
        layout: TargetLayout,
        rng: &mut R,
    ) -> Result<()> {
        self.check_top_row_fits(1)?;

        self.clear_blocks();
        self.clear_targs();
        self.clear_equation();
        self.ensure_piles(&[Denom::One]);
        self.place_top_row(rng)?;

        let rows = self.grid.nonplay_rows();
        let (_, cols) = self.grid.shape();
        let coords = match layout {
            TargetLayout::Random => {
                let taken: AHashSet<Coord> = self.objects.iter().map(|o| o.coord).collect();
                placement::random_coords(rng, n, rows, cols, &taken)?
            }
            TargetLayout::Even => placement::even_row(rng, n, rows, cols)?,
            TargetLayout::Uneven => {
                placement::uneven_row(rng, n, rows, cols, self.config.targets.max_spacing)?
            }
            TargetLayout::Vertical => placement::vertical_column(rng, n, rows, cols)?,
        };
        for coord in coords {
            self.make_object(ObjKind::Target, coord);
        }

        self.targ_val = n as u32;
        debug!(n, ?layout, "targets reset");
        self.grid.reset();
        self.draw_register();
        Ok(())
    }

    /// Keeps exactly one pile for each listed denomination
    fn ensure_piles(&mut self, denoms: &[Denom]) {
        let mut seen = BTreeSet::new();
        let piles: Vec<ObjId> = self.piles.iter().copied().collect();
        for id in piles {
            let denom = match self.objects.get(id).map(|o| o.kind) {
                Some(ObjKind::Pile(d)) => d,
                _ => continue,
            };
            if !denoms.contains(&denom) || !seen.insert(denom) {
                self.delete_obj(id);
            }
        }
        let start = Coord::new(first_playable_row(&self.grid), 0);
        for denom in denoms {
            if !seen.contains(denom) {
                self.make_object(ObjKind::Pile(*denom), start);
            }
        }
    }

    /// Puts the piles, the button and the player on distinct random
    /// columns of the top playable row
    fn place_top_row<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        if self.button.is_none() {
            let start = Coord::new(first_playable_row(&self.grid), 0);
            self.make_object(ObjKind::Button, start);
        }
        let mut ids: Vec<ObjId> = self.piles.iter().copied().collect();
        ids.extend(self.button);

        let row = first_playable_row(&self.grid);
        let (_, n_cols) = self.grid.shape();
        let cols = placement::distinct_columns(rng, n_cols, ids.len() + 1)?;
        for (id, col) in ids.iter().zip(&cols) {
            self.move_obj(*id, Coord::new(row, *col));
        }
        self.player.drop_held();
        if let Some(col) = cols.last() {
            self.place_player(Coord::new(row, *col));
        }
        Ok(())
    }

    /// The top row must hold `n_piles` piles, the button and the player
    fn check_top_row_fits(&self, n_piles: usize) -> Result<()> {
        let needed = n_piles + 2;
        let available = self.grid.shape().1.max(0) as usize;
        if needed > available {
            return Err(GridError::NotEnoughColumns { needed, available });
        }
        Ok(())
    }

    fn check_equation_fits(&self, left: &[Denom], op: Operation, right: &[Denom]) -> Result<()> {
        let (start, end) = self.grid.nonplay_rows();
        let (_, cols) = self.grid.shape();
        let tallest = left
            .iter()
            .chain(right)
            .map(|d| d.block_size().rows)
            .chain(std::iter::once(op.size().rows))
            .max()
            .unwrap_or(1);
        if tallest > end - start {
            return Err(GridError::LayoutDoesNotFit {
                what: "equation height".to_string(),
                needed: tallest,
                available: end - start,
            });
        }
        let width: i32 = left
            .iter()
            .chain(right)
            .map(|d| d.block_size().cols)
            .sum::<i32>()
            + op.size().cols
            + 2 * EQUATION_GAP;
        if width > cols {
            return Err(GridError::LayoutDoesNotFit {
                what: "equation width".to_string(),
                needed: width,
                available: cols,
            });
        }
        Ok(())
    }

    /// Places an object at the first free spot of `row` at or right of
    /// `min_col`. Returns the id and the column just past the object.
    fn place_on_row(&mut self, kind: ObjKind, row: i32, min_col: i32) -> Result<(ObjId, i32)> {
        let size = kind.default_size();
        let Some(coord) = self.avail_coord_on_row(row, min_col, size) else {
            return Err(GridError::LayoutDoesNotFit {
                what: "equation row".to_string(),
                needed: min_col + size.cols,
                available: self.grid.shape().1,
            });
        };
        let id = self.add_obj(kind, coord, size);
        Ok((id, coord.col + size.cols))
    }
}

/// Top row the player may occupy
fn first_playable_row(grid: &Grid) -> i32 {
    match (grid.is_divided(), grid.playable_half()) {
        (true, PlayableHalf::Lower) => grid.middle_row() + 1,
        _ => 0,
    }
}
