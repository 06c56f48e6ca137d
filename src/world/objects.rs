//! Game objects and the arena that owns them

use crate::core::types::{Coord, ObjId, Size};
use crate::render::colors;
use crate::world::denomination::Denom;
use serde::{Deserialize, Serialize};

/// Arithmetic operation shown by the operator marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
}

impl Operation {
    /// Operators are told apart by shape
    pub fn size(&self) -> Size {
        match self {
            Operation::Add => Size::new(2, 1),
            Operation::Subtract => Size::new(1, 2),
            Operation::Multiply => Size::new(1, 1),
        }
    }

    /// Applies the operation; subtraction saturates at zero
    pub fn apply(&self, left: u32, right: u32) -> u32 {
        match self {
            Operation::Add => left + right,
            Operation::Subtract => left.saturating_sub(right),
            Operation::Multiply => left * right,
        }
    }
}

/// Closed set of object variants. Doubles as the type key of the spatial index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjKind {
    /// Generic inert marker
    Marker,
    /// Count target in the non-playable half
    Target,
    Player,
    /// Block factory for one denomination
    Pile(Denom),
    Block(Denom),
    /// Ends the episode when grabbed
    Button,
    /// Equation marker; never interacts
    Operator(Operation),
    Divider,
}

impl ObjKind {
    /// Default footprint for this kind
    pub fn default_size(&self) -> Size {
        match self {
            ObjKind::Block(denom) => denom.block_size(),
            ObjKind::Operator(op) => op.size(),
            _ => Size::UNIT,
        }
    }

    /// Grab priority when several objects share the player's cell;
    /// lower wins. `None` means the kind can't be grabbed.
    ///
    /// Order: button, then blocks from smallest to largest value, then
    /// piles from smallest to largest value.
    pub fn grab_priority(&self) -> Option<u8> {
        const N: u8 = Denom::ALL.len() as u8;
        match self {
            ObjKind::Button => Some(0),
            ObjKind::Block(denom) => Some(1 + denom.index() as u8),
            ObjKind::Pile(denom) => Some(1 + N + denom.index() as u8),
            _ => None,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, ObjKind::Player)
    }

    pub fn is_block(&self) -> bool {
        matches!(self, ObjKind::Block(_))
    }

    pub fn is_pile(&self) -> bool {
        matches!(self, ObjKind::Pile(_))
    }

    pub fn block_denom(&self) -> Option<Denom> {
        match self {
            ObjKind::Block(denom) => Some(*denom),
            _ => None,
        }
    }
}

/// An object placed on the grid
#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    pub id: ObjId,
    pub kind: ObjKind,
    /// Upper-left anchor in grid units
    pub coord: Coord,
    pub size: Size,
    pub color: f32,
    /// Where the object was last drawn; `None` until the first draw
    pub prev_coord: Option<Coord>,
}

impl GameObject {
    /// Object with the kind's default size and colour
    pub fn new(id: ObjId, kind: ObjKind, coord: Coord) -> Self {
        Self::with_size(id, kind, coord, kind.default_size())
    }

    pub fn with_size(id: ObjId, kind: ObjKind, coord: Coord, size: Size) -> Self {
        Self {
            id,
            kind,
            coord,
            size,
            color: colors::kind_color(kind),
            prev_coord: None,
        }
    }

    pub fn block_denom(&self) -> Option<Denom> {
        self.kind.block_denom()
    }

    /// Block value, zero for non-blocks
    pub fn value(&self) -> u32 {
        self.block_denom().map(|d| d.value()).unwrap_or(0)
    }
}

/// An object the player is carrying and where it sits relative to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Held {
    pub obj: ObjId,
    /// Held object's anchor minus the player's anchor, fixed at grab time
    pub offset: Coord,
}

/// Player handle plus carrying state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: ObjId,
    pub held: Option<Held>,
}

impl Player {
    pub fn new(id: ObjId) -> Self {
        Self { id, held: None }
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    pub fn held_obj(&self) -> Option<ObjId> {
        self.held.map(|h| h.obj)
    }

    pub fn grab(&mut self, obj: ObjId, offset: Coord) {
        self.held = Some(Held { obj, offset });
    }

    /// Releases the held object, returning it
    pub fn drop_held(&mut self) -> Option<ObjId> {
        self.held.take().map(|h| h.obj)
    }

    /// Where the held object would sit if the player stood at `player_coord`
    pub fn subj_held_coord(&self, player_coord: Coord) -> Option<Coord> {
        self.held.map(|h| player_coord + h.offset)
    }
}

/// Arena of live objects keyed by stable id
///
/// Slots are indexed by id and never reused, so iteration is in creation
/// order and deterministic.
#[derive(Debug, Clone, Default)]
pub struct ObjectTable {
    slots: Vec<Option<GameObject>>,
    live: usize,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next inserted object will get
    pub fn next_id(&self) -> ObjId {
        ObjId(self.slots.len() as u32)
    }

    /// Creates an object of the given kind, returning its id
    pub fn spawn(&mut self, kind: ObjKind, coord: Coord, size: Size) -> ObjId {
        let id = self.next_id();
        self.slots.push(Some(GameObject::with_size(id, kind, coord, size)));
        self.live += 1;
        id
    }

    pub fn get(&self, id: ObjId) -> Option<&GameObject> {
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjId) -> Option<&mut GameObject> {
        self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    /// Two distinct objects mutably at once
    pub fn pair_mut(&mut self, a: ObjId, b: ObjId) -> Option<(&mut GameObject, &mut GameObject)> {
        let (ia, ib) = (a.0 as usize, b.0 as usize);
        if ia == ib || ia >= self.slots.len() || ib >= self.slots.len() {
            return None;
        }
        if ia < ib {
            let (lo, hi) = self.slots.split_at_mut(ib);
            Some((lo[ia].as_mut()?, hi[0].as_mut()?))
        } else {
            let (lo, hi) = self.slots.split_at_mut(ia);
            let (b_obj, a_obj) = (lo[ib].as_mut()?, hi[0].as_mut()?);
            Some((a_obj, b_obj))
        }
    }

    pub fn contains(&self, id: ObjId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: ObjId) -> Option<GameObject> {
        let removed = self.slots.get_mut(id.0 as usize).and_then(|s| s.take());
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    /// Live objects in creation order
    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.slots.iter_mut().filter_map(|s| s.as_mut())
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjId> + '_ {
        self.iter().map(|o| o.id)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_get() {
        let mut objects = ObjectTable::new();
        let id = objects.spawn(ObjKind::Block(Denom::Five), Coord::new(1, 2), Denom::Five.block_size());
        let obj = objects.get(id).unwrap();
        assert_eq!(obj.coord, Coord::new(1, 2));
        assert_eq!(obj.size, Size::new(5, 1));
        assert_eq!(obj.value(), 5);
        assert_eq!(obj.prev_coord, None);
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn test_remove_never_reuses_ids() {
        let mut objects = ObjectTable::new();
        let a = objects.spawn(ObjKind::Marker, Coord::new(0, 0), Size::UNIT);
        assert!(objects.remove(a).is_some());
        assert!(objects.remove(a).is_none());
        let b = objects.spawn(ObjKind::Marker, Coord::new(0, 0), Size::UNIT);
        assert_ne!(a, b);
        assert!(!objects.contains(a));
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn test_pair_mut_both_orders() {
        let mut objects = ObjectTable::new();
        let a = objects.spawn(ObjKind::Player, Coord::new(0, 0), Size::UNIT);
        let b = objects.spawn(ObjKind::Button, Coord::new(1, 1), Size::UNIT);
        {
            let (pa, pb) = objects.pair_mut(a, b).unwrap();
            assert_eq!(pa.kind, ObjKind::Player);
            assert_eq!(pb.kind, ObjKind::Button);
        }
        {
            let (pb, pa) = objects.pair_mut(b, a).unwrap();
            assert_eq!(pb.kind, ObjKind::Button);
            assert_eq!(pa.kind, ObjKind::Player);
        }
        assert!(objects.pair_mut(a, a).is_none());
    }

    #[test]
    fn test_grab_priority_order() {
        let button = ObjKind::Button.grab_priority().unwrap();
        let b1 = ObjKind::Block(Denom::One).grab_priority().unwrap();
        let b100 = ObjKind::Block(Denom::Hundred).grab_priority().unwrap();
        let p1 = ObjKind::Pile(Denom::One).grab_priority().unwrap();
        let p100 = ObjKind::Pile(Denom::Hundred).grab_priority().unwrap();
        assert!(button < b1 && b1 < b100 && b100 < p1 && p1 < p100);
        assert_eq!(ObjKind::Player.grab_priority(), None);
        assert_eq!(ObjKind::Target.grab_priority(), None);
        assert_eq!(ObjKind::Operator(Operation::Add).grab_priority(), None);
    }

    #[test]
    fn test_player_held_offset() {
        let mut player = Player::new(ObjId(0));
        assert_eq!(player.subj_held_coord(Coord::new(3, 3)), None);
        player.grab(ObjId(4), Coord::new(-1, 0));
        assert!(player.is_holding());
        assert_eq!(player.subj_held_coord(Coord::new(3, 3)), Some(Coord::new(2, 3)));
        assert_eq!(player.drop_held(), Some(ObjId(4)));
        assert!(!player.is_holding());
    }

    #[test]
    fn test_operation_shapes_and_values() {
        assert_eq!(Operation::Add.size(), Size::new(2, 1));
        assert_eq!(Operation::Subtract.size(), Size::new(1, 2));
        assert_eq!(Operation::Add.apply(3, 4), 7);
        assert_eq!(Operation::Subtract.apply(3, 4), 0);
        assert_eq!(Operation::Multiply.apply(3, 4), 12);
    }
}
