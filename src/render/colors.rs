//! Scalar colour table for object kinds
//!
//! Colours are summed where objects overlap, so the values are chosen to
//! keep common overlaps distinguishable in the rendered buffer.

use crate::world::denomination::Denom;
use crate::world::objects::ObjKind;

/// Background colour of an empty unit
pub const DEFAULT: f32 = 0.0;
pub const DIVIDER: f32 = -0.3;
pub const PLAYER: f32 = 0.1712345;
pub const BUTTON: f32 = -0.2;
pub const OPERATOR: f32 = -0.08;
pub const TARGET: f32 = 0.2513;
pub const MARKER: f32 = 0.0;

/// Base offset added to a block colour to get its pile colour
pub const PILE_BASE: f32 = 0.01;

/// Block colour per denomination
pub fn block_color(denom: Denom) -> f32 {
    match denom {
        Denom::One => 0.071,
        Denom::Five => 0.0901,
        Denom::Ten => 0.11001,
        Denom::Fifty => 0.130001,
        Denom::Hundred => 0.1600001,
    }
}

pub fn pile_color(denom: Denom) -> f32 {
    PILE_BASE + block_color(denom)
}

/// Colour an object of this kind is drawn with
pub fn kind_color(kind: ObjKind) -> f32 {
    match kind {
        ObjKind::Marker => MARKER,
        ObjKind::Target => TARGET,
        ObjKind::Player => PLAYER,
        ObjKind::Pile(denom) => pile_color(denom),
        ObjKind::Block(denom) => block_color(denom),
        ObjKind::Button => BUTTON,
        ObjKind::Operator(_) => OPERATOR,
        ObjKind::Divider => DIVIDER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_colors_are_distinct() {
        let colors: Vec<f32> = Denom::ALL.iter().map(|d| block_color(*d)).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_pile_differs_from_block() {
        for denom in Denom::ALL {
            assert_ne!(pile_color(denom), block_color(denom));
        }
    }
}
