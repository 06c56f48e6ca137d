//! Block denominations
//!
//! Blocks carry one value from a fixed set. A block's footprint and the
//! layout of its decomposition are pure functions of that value.

use crate::core::error::{GridError, Result};
use crate::core::types::{Coord, Size};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Denom {
    One,
    Five,
    Ten,
    Fifty,
    Hundred,
}

impl Denom {
    /// All denominations, ascending by value
    pub const ALL: [Denom; 5] = [
        Denom::One,
        Denom::Five,
        Denom::Ten,
        Denom::Fifty,
        Denom::Hundred,
    ];

    pub const SMALLEST: Denom = Denom::One;
    pub const LARGEST: Denom = Denom::Hundred;

    pub fn value(&self) -> u32 {
        match self {
            Denom::One => 1,
            Denom::Five => 5,
            Denom::Ten => 10,
            Denom::Fifty => 50,
            Denom::Hundred => 100,
        }
    }

    pub fn from_value(value: u32) -> Option<Denom> {
        Self::ALL.into_iter().find(|d| d.value() == value)
    }

    pub fn try_from_value(value: u32) -> Result<Denom> {
        Self::from_value(value).ok_or(GridError::UnknownDenomination(value))
    }

    /// Position in the ascending order
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Footprint of a block of this value
    pub fn block_size(&self) -> Size {
        match self {
            Denom::One => Size::new(1, 1),
            Denom::Five => Size::new(5, 1),
            Denom::Ten => Size::new(10, 1),
            Denom::Fifty => Size::new(10, 5),
            Denom::Hundred => Size::new(20, 5),
        }
    }

    pub fn next_up(&self) -> Option<Denom> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn next_down(&self) -> Option<Denom> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// How many blocks of this value make one block of the next denomination
    pub fn merge_ratio(&self) -> Option<u32> {
        self.next_up().map(|up| up.value() / self.value())
    }

    /// Pieces a block of this value splits into, with each piece's offset
    /// from the original anchor. Pieces tile the original footprint.
    ///
    /// Counts come from the greedy split over the smaller denominations,
    /// so a denomination set where greedy is not minimal would produce
    /// more pieces than necessary.
    pub fn decomposition(&self) -> Vec<(Denom, Coord)> {
        let smaller = &Self::ALL[..self.index()];
        if smaller.is_empty() {
            return Vec::new();
        }
        let atoms: Vec<u32> = smaller.iter().map(|d| d.value()).collect();
        let counts = decompose_value(self.value(), &atoms);
        let offsets = self.decomp_offsets();

        let mut pieces = Vec::with_capacity(offsets.len());
        for denom in smaller.iter().rev() {
            let n = counts.get(&denom.value()).copied().unwrap_or(0);
            for _ in 0..n {
                let offset = offsets.get(pieces.len()).copied().unwrap_or_default();
                pieces.push((*denom, offset));
            }
        }
        debug_assert_eq!(pieces.len(), offsets.len());
        pieces
    }

    /// Fixed piece layout relative to the decomposed block's anchor
    fn decomp_offsets(&self) -> &'static [Coord] {
        const FIVE: [Coord; 5] = [
            Coord::new(0, 0),
            Coord::new(1, 0),
            Coord::new(2, 0),
            Coord::new(3, 0),
            Coord::new(4, 0),
        ];
        const TEN: [Coord; 2] = [Coord::new(0, 0), Coord::new(5, 0)];
        const FIFTY: [Coord; 5] = [
            Coord::new(0, 0),
            Coord::new(0, 1),
            Coord::new(0, 2),
            Coord::new(0, 3),
            Coord::new(0, 4),
        ];
        const HUNDRED: [Coord; 2] = [Coord::new(0, 0), Coord::new(10, 0)];
        match self {
            Denom::One => &[],
            Denom::Five => &FIVE,
            Denom::Ten => &TEN,
            Denom::Fifty => &FIFTY,
            Denom::Hundred => &HUNDRED,
        }
    }
}

/// Splits `val` into `atoms`, taking as many of the largest atom as
/// possible before moving to the next.
///
/// Not guaranteed to use the fewest atoms: with atoms {1, 7, 10} and
/// val 14 this returns one 10 and four 1s rather than two 7s. Any
/// remainder smaller than the smallest atom is dropped.
pub fn decompose_value(val: u32, atoms: &[u32]) -> BTreeMap<u32, u32> {
    let mut sorted: Vec<u32> = atoms.iter().copied().filter(|a| *a > 0).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();

    let mut counts = BTreeMap::new();
    let mut remaining = val;
    for atom in sorted {
        let count = remaining / atom;
        remaining -= count * atom;
        counts.insert(atom, count);
    }
    counts
}

/// Greedy split of `val` into denominations, largest first
pub fn val_to_denoms(val: u32) -> Vec<Denom> {
    let atoms: Vec<u32> = Denom::ALL.iter().map(|d| d.value()).collect();
    let counts = decompose_value(val, &atoms);
    let mut denoms = Vec::new();
    for denom in Denom::ALL.iter().rev() {
        let n = counts.get(&denom.value()).copied().unwrap_or(0);
        denoms.extend(std::iter::repeat(*denom).take(n as usize));
    }
    denoms
}
