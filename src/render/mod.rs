//! Compositing of registry objects into the grid's pixel buffer
//!
//! Colours of overlapping objects add. Drawing never changes simulation
//! state beyond each object's `prev_coord`, which records where it was
//! last drawn so later draws can diff against it.

pub mod colors;

use crate::core::types::{Coord, Size};
use crate::spatial::grid::Grid;
use crate::world::objects::{GameObject, ObjKind, ObjectTable};

/// Clears the buffer (keeping the divider) and draws every object
pub fn draw_register(grid: &mut Grid, objects: &mut ObjectTable) {
    grid.clear(false);
    for obj in objects.iter_mut() {
        paint(grid, obj.coord, obj.size, obj.color);
        obj.prev_coord = Some(obj.coord);
    }
}

/// Redraws only objects whose position changed since their last draw.
/// Objects never drawn are painted fresh.
pub fn draw_register_changes(grid: &mut Grid, objects: &mut ObjectTable) {
    for obj in objects.iter_mut() {
        if obj.prev_coord == Some(obj.coord) {
            continue;
        }
        if let Some(prev) = obj.prev_coord {
            paint(grid, prev, obj.size, -obj.color);
        }
        paint(grid, obj.coord, obj.size, obj.color);
        obj.prev_coord = Some(obj.coord);
    }
}

/// Removes a deleted object's colour from where it was last drawn
pub fn erase_obj(grid: &mut Grid, obj: &GameObject) {
    if let Some(prev) = obj.prev_coord {
        paint(grid, prev, obj.size, -obj.color);
    }
}

/// Adds `color` unit by unit so every unit keeps its own blank pixel edge
fn paint(grid: &mut Grid, coord: Coord, size: Size, color: f32) {
    for cell in Grid::footprint(coord, size) {
        grid.draw(cell, Size::UNIT, color, true);
    }
}

/// Text frame of the grid, one character per unit. Where objects stack
/// the most interactive one is shown.
pub fn ascii_frame(grid: &Grid, objects: &ObjectTable) -> String {
    let (rows, cols) = grid.shape();
    let mut cells: Vec<(u8, char)> = vec![(0, '.'); (rows.max(0) * cols.max(0)) as usize];
    if grid.is_divided() {
        let middle = grid.middle_row();
        for col in 0..cols {
            cells[(middle * cols + col) as usize] = (1, '-');
        }
    }
    for obj in objects.iter() {
        let (rank, glyph) = glyph(obj.kind);
        for cell in Grid::footprint(obj.coord, obj.size) {
            if !grid.is_inbounds(cell, Size::UNIT) {
                continue;
            }
            let slot = &mut cells[(cell.row * cols + cell.col) as usize];
            if rank >= slot.0 {
                *slot = (rank, glyph);
            }
        }
    }
    let mut out = String::with_capacity(cells.len() + rows.max(0) as usize);
    for row in cells.chunks(cols.max(1) as usize) {
        out.extend(row.iter().map(|(_, c)| *c));
        out.push('\n');
    }
    out
}

fn glyph(kind: ObjKind) -> (u8, char) {
    match kind {
        ObjKind::Player => (9, '@'),
        ObjKind::Button => (8, 'B'),
        ObjKind::Pile(_) => (7, 'P'),
        ObjKind::Block(denom) => (
            6,
            match denom.value() {
                1 => '1',
                5 => '5',
                10 => 'x',
                50 => 'L',
                _ => 'C',
            },
        ),
        ObjKind::Operator(_) => (5, '+'),
        ObjKind::Target => (4, 'T'),
        ObjKind::Marker => (3, 'm'),
        ObjKind::Divider => (2, '-'),
    }
}
