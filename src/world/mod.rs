//! Object model, denominations and episode placement

pub mod denomination;
pub mod objects;
pub mod placement;

pub use denomination::{decompose_value, val_to_denoms, Denom};
pub use objects::{GameObject, Held, ObjKind, ObjectTable, Operation, Player};
