pub mod config;
pub mod error;
pub mod types;

pub use config::{DropPolicy, GameConfig, GridConfig, PlayableHalf, TargetConfig, TargetLayout};
pub use error::{GridError, Result};
pub use types::{Coord, Direction, Event, ObjId, Size};
