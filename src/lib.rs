//! Gridworld - spatial object registry for discrete 2-D grid-world environments

pub mod core;
pub mod registry;
pub mod render;
pub mod spatial;
pub mod world;

pub use crate::core::{
    Coord, Direction, DropPolicy, Event, GameConfig, GridConfig, GridError, ObjId, PlayableHalf,
    Result, Size, TargetConfig, TargetLayout,
};
pub use crate::registry::Registry;
pub use crate::world::{Denom, GameObject, ObjKind, Operation};
