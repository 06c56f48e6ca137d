//! Pixel grid: unit/pixel conversion, bounds checks and colour compositing
//!
//! Coordinates are (row, col) in grid units. A unit covers a square of
//! `density x density` pixels in the buffer.

use crate::core::config::{GridConfig, PlayableHalf};
use crate::core::types::{Coord, Size};
use crate::render::colors;
use ahash::AHashSet;

/// Rasterized grid of scalar colours
#[derive(Debug, Clone)]
pub struct Grid {
    rows: i32,
    cols: i32,
    density: usize,
    divided: bool,
    playable_half: PlayableHalf,
    pixels: Vec<f32>,
}

impl Grid {
    pub fn new(config: &GridConfig) -> Self {
        let mut grid = Self {
            rows: config.rows.max(0),
            cols: config.cols.max(0),
            density: config.pixel_density.max(1),
            divided: config.divided,
            playable_half: config.playable_half,
            pixels: Vec::new(),
        };
        grid.reset();
        grid
    }

    /// Undivided grid with one pixel per unit
    pub fn undivided(rows: i32, cols: i32) -> Self {
        Self::new(&GridConfig {
            rows,
            cols,
            pixel_density: 1,
            divided: false,
            playable_half: PlayableHalf::Upper,
        })
    }

    /// Shape in grid units (rows, cols)
    pub fn shape(&self) -> (i32, i32) {
        (self.rows, self.cols)
    }

    /// Shape in pixels (rows, cols); fixed for the lifetime of the grid
    pub fn pixel_shape(&self) -> (usize, usize) {
        (
            self.rows as usize * self.density,
            self.cols as usize * self.density,
        )
    }

    pub fn density(&self) -> usize {
        self.density
    }

    pub fn is_divided(&self) -> bool {
        self.divided
    }

    pub fn playable_half(&self) -> PlayableHalf {
        self.playable_half
    }

    /// The divider row. Rounds down, so an even row count puts the
    /// divider just below the centre line.
    pub fn middle_row(&self) -> i32 {
        self.rows / 2
    }

    /// Read-only view of the pixel buffer in row-major order
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// Owned copy of the pixel buffer
    pub fn snapshot(&self) -> Vec<f32> {
        self.pixels.clone()
    }

    pub fn pixel(&self, prow: usize, pcol: usize) -> Option<f32> {
        let (h, w) = self.pixel_shape();
        if prow < h && pcol < w {
            Some(self.pixels[prow * w + pcol])
        } else {
            None
        }
    }

    /// Colour of the upper-left pixel of a grid unit
    pub fn unit_color(&self, coord: Coord) -> Option<f32> {
        if !self.is_inbounds(coord, Size::UNIT) {
            return None;
        }
        let (prow, pcol) = self.units_to_pixels(coord);
        self.pixel(prow, pcol)
    }

    #[inline]
    pub fn units_to_pixels(&self, coord: Coord) -> (usize, usize) {
        (
            coord.row.max(0) as usize * self.density,
            coord.col.max(0) as usize * self.density,
        )
    }

    /// Pixel position to the unit containing it (rounds down)
    #[inline]
    pub fn pixels_to_units(&self, prow: usize, pcol: usize) -> Coord {
        Coord::new((prow / self.density) as i32, (pcol / self.density) as i32)
    }

    pub fn row_inbounds(&self, row: i32, n_rows: i32) -> bool {
        row >= 0 && row + (n_rows - 1) < self.rows
    }

    pub fn col_inbounds(&self, col: i32, n_cols: i32) -> bool {
        col >= 0 && col + (n_cols - 1) < self.cols
    }

    /// True if the whole rectangle lies on the grid
    pub fn is_inbounds(&self, coord: Coord, size: Size) -> bool {
        self.row_inbounds(coord.row, size.rows) && self.col_inbounds(coord.col, size.cols)
    }

    /// True if the whole rectangle lies in the player's half of a divided grid
    pub fn is_inhalfbounds(&self, coord: Coord, size: Size) -> bool {
        let middle = self.middle_row();
        let last_row = coord.row + (size.rows - 1);
        let rows_ok = match self.playable_half {
            PlayableHalf::Upper => coord.row >= 0 && last_row < middle,
            PlayableHalf::Lower => coord.row > middle && last_row < self.rows,
        };
        rows_ok && self.col_inbounds(coord.col, size.cols)
    }

    /// True if the rectangle lies where the player may move. On an
    /// undivided grid this is plain bounds checking.
    pub fn is_playable(&self, coord: Coord, size: Size) -> bool {
        if self.divided {
            self.is_inhalfbounds(coord, size)
        } else {
            self.is_inbounds(coord, size)
        }
    }

    /// True if the rectangle lies on the far side of the divider
    /// (where targets and equations live). Undivided grids have no
    /// far side, so this degrades to bounds checking.
    pub fn is_innonplaybounds(&self, coord: Coord, size: Size) -> bool {
        if !self.divided {
            return self.is_inbounds(coord, size);
        }
        let middle = self.middle_row();
        let last_row = coord.row + (size.rows - 1);
        let rows_ok = match self.playable_half {
            PlayableHalf::Upper => coord.row > middle && last_row < self.rows,
            PlayableHalf::Lower => coord.row >= 0 && last_row < middle,
        };
        rows_ok && self.col_inbounds(coord.col, size.cols)
    }

    /// First and one-past-last row of the non-playable half
    pub fn nonplay_rows(&self) -> (i32, i32) {
        if !self.divided {
            return (0, self.rows);
        }
        match self.playable_half {
            PlayableHalf::Upper => (self.middle_row() + 1, self.rows),
            PlayableHalf::Lower => (0, self.middle_row()),
        }
    }

    /// Every unit coordinate covered by a rectangle anchored at its upper-left corner
    pub fn all_coords(coord: Coord, size: Size) -> AHashSet<Coord> {
        Self::footprint(coord, size).collect()
    }

    /// Iterator form of `all_coords`, row-major
    pub fn footprint(coord: Coord, size: Size) -> impl Iterator<Item = Coord> {
        (0..size.rows.max(0)).flat_map(move |dr| {
            (0..size.cols.max(0)).map(move |dc| Coord::new(coord.row + dr, coord.col + dc))
        })
    }

    /// Writes (or adds) `color` over a rectangle. Parts outside the grid are clipped.
    pub fn draw(&mut self, coord: Coord, size: Size, color: f32, add_color: bool) {
        let end = Coord::new(coord.row + size.rows, coord.col + size.cols);
        self.slice_draw(coord, end, color, add_color);
    }

    /// Draws over units `[coord0, coord1)` like a 2-D slice assignment
    pub fn slice_draw(&mut self, coord0: Coord, coord1: Coord, color: f32, add_color: bool) {
        let row0 = coord0.row.max(0);
        let col0 = coord0.col.max(0);
        let row1 = coord1.row.min(self.rows);
        let col1 = coord1.col.min(self.cols);
        if row0 >= row1 || col0 >= col1 {
            return;
        }

        let d = self.density;
        // With more than one pixel per unit, the last pixel row/column stays blank
        let empty = 1.min(d - 1);
        let (_, width) = self.pixel_shape();
        let (pr0, pc0) = (row0 as usize * d, col0 as usize * d);
        let (pr1, pc1) = (row1 as usize * d - empty, col1 as usize * d - empty);
        for prow in pr0..pr1 {
            let line = &mut self.pixels[prow * width + pc0..prow * width + pc1];
            if add_color {
                line.iter_mut().for_each(|p| *p += color);
            } else {
                line.iter_mut().for_each(|p| *p = color);
            }
        }
    }

    /// Replaces the middle row with the divider colour
    pub fn draw_divider(&mut self) {
        let middle = self.middle_row();
        self.draw(
            Coord::new(middle, 0),
            Size::new(1, self.cols),
            colors::DIVIDER,
            false,
        );
    }

    /// Resets a single unit to the default colour
    pub fn clear_unit(&mut self, coord: Coord) {
        self.draw(coord, Size::UNIT, colors::DEFAULT, false);
    }

    /// Clears the player's half of the grid, leaving the rest untouched
    pub fn clear_playable_space(&mut self) {
        let middle = self.middle_row();
        if !self.divided {
            self.clear(false);
            return;
        }
        match self.playable_half {
            PlayableHalf::Upper => {
                self.draw(Coord::new(0, 0), Size::new(middle, self.cols), colors::DEFAULT, false)
            }
            PlayableHalf::Lower => self.draw(
                Coord::new(middle + 1, 0),
                Size::new(self.rows - middle - 1, self.cols),
                colors::DEFAULT,
                false,
            ),
        }
    }

    /// Clears the whole buffer in place; the divider is redrawn unless removed
    pub fn clear(&mut self, remove_divider: bool) {
        self.pixels.iter_mut().for_each(|p| *p = colors::DEFAULT);
        if self.divided && !remove_divider {
            self.draw_divider();
        }
    }

    /// Rebuilds the buffer from scratch at the configured shape
    pub fn reset(&mut self) {
        let (h, w) = self.pixel_shape();
        self.pixels = vec![colors::DEFAULT; h * w];
        if self.divided {
            self.draw_divider();
        }
    }
}
