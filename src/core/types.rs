//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Grid coordinate in grid units (not pixels)
///
/// Rows grow downward, columns grow rightward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Squared euclidean distance; ordering-equivalent to the true distance
    pub fn distance_sq(&self, other: &Self) -> i64 {
        let dr = (self.row - other.row) as i64;
        let dc = (self.col - other.col) as i64;
        dr * dr + dc * dc
    }

    pub fn distance(&self, other: &Self) -> f32 {
        (self.distance_sq(other) as f32).sqrt()
    }

    /// Coordinate one step in the given direction
    pub fn step(&self, direction: Direction) -> Self {
        let (dr, dc) = direction.delta();
        Self::new(self.row + dr, self.col + dc)
    }
}

impl Add for Coord {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.row + rhs.row, self.col + rhs.col)
    }
}

impl Sub for Coord {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.row - rhs.row, self.col - rhs.col)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

/// Rectangular footprint size (rows downward, cols rightward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub rows: i32,
    pub cols: i32,
}

impl Size {
    pub const UNIT: Size = Size::new(1, 1);

    pub const fn new(rows: i32, cols: i32) -> Self {
        Self { rows, cols }
    }

    pub fn area(&self) -> usize {
        (self.rows.max(0) * self.cols.max(0)) as usize
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Stable handle of an object in the registry arena
///
/// Ids are never reused within a registry, so a stale handle can only
/// ever miss, never alias a newer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjId(pub u32);

/// Player movement command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    #[default]
    Stay = 0,
    Up = 1,
    Right = 2,
    Down = 3,
    Left = 4,
}

impl Direction {
    pub const ALL: [Direction; 5] = [
        Direction::Stay,
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// (row, col) delta applied by this direction
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Stay => (0, 0),
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
        }
    }

    /// Maps an integer action onto a direction, wrapping like the action space does
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

/// Outcome of a registry step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// Nothing of interest occurred
    Step,
    /// The player grabbed the button; the episode is over
    ButtonPress,
    /// A required free-space search exhausted the grid; the episode is over
    Full,
}

impl Event {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Event::Step)
    }
}
