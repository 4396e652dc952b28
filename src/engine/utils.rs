use crate::rng::RandomSource;
use crate::types::{Cell, Direction};
use crate::world::Grid;

pub(super) fn manhattan(a: Cell, b: Cell) -> i32 {
    (a.row - b.row).abs() + (a.col - b.col).abs()
}

/// Adjacent cell, wrapping the column on portal rows.
pub(super) fn neighbor(grid: &Grid, cell: Cell, dir: Direction) -> Cell {
    let next = cell.step(dir);
    if grid.is_portal_row(next.row) {
        Cell::new(next.row, next.col.rem_euclid(grid.width()))
    } else {
        next
    }
}

pub(super) fn random_direction<R: RandomSource + ?Sized>(rng: &mut R) -> Direction {
    Direction::ALL[rng.pick_index(Direction::ALL.len())]
}
