use std::collections::BTreeSet;

use crate::constants::HOUSE_SLOT_SPACING;
use crate::error::GridError;
use crate::types::{Cell, Direction, DotKind, HomeSlot, Position, TileKind};

/// Arcade-style maze. Legend: `X` wall, `.` dot, `o` power dot, space open,
/// `T` portal, `-` gate door, `H` house interior, `P` player start.
pub const CLASSIC_LAYOUT: [&str; 31] = [
    "XXXXXXXXXXXXXXXXXXXXXXXXXXXX",
    "X............XX............X",
    "X.XXXX.XXXXX.XX.XXXXX.XXXX.X",
    "XoXXXX.XXXXX.XX.XXXXX.XXXXoX",
    "X.XXXX.XXXXX.XX.XXXXX.XXXX.X",
    "X..........................X",
    "X.XXXX.XX.XXXXXXXX.XX.XXXX.X",
    "X.XXXX.XX.XXXXXXXX.XX.XXXX.X",
    "X......XX....XX....XX......X",
    "XXXXXX.XXXXX XX XXXXX.XXXXXX",
    "XXXXXX.XXXXX XX XXXXX.XXXXXX",
    "XXXXXX.XX          XX.XXXXXX",
    "XXXXXX.XX XXX-XXXX XX.XXXXXX",
    "XXXXXX.XX XHHHHHHX XX.XXXXXX",
    "T     .   XHHHHHHX   .     T",
    "XXXXXX.XX XHHHHHHX XX.XXXXXX",
    "XXXXXX.XX XXXXXXXX XX.XXXXXX",
    "XXXXXX.XX          XX.XXXXXX",
    "XXXXXX.XX XXXXXXXX XX.XXXXXX",
    "XXXXXX.XX XXXXXXXX XX.XXXXXX",
    "X............XX............X",
    "X.XXXX.XXXXX.XX.XXXXX.XXXX.X",
    "X.XXXX.XXXXX.XX.XXXXX.XXXX.X",
    "Xo..XX.......P .......XX..oX",
    "XXX.XX.XX.XXXXXXXX.XX.XX.XXX",
    "XXX.XX.XX.XXXXXXXX.XX.XX.XXX",
    "X......XX....XX....XX......X",
    "X.XXXXXXXXXX.XX.XXXXXXXXXX.X",
    "X.XXXXXXXXXX.XX.XXXXXXXXXX.X",
    "X..........................X",
    "XXXXXXXXXXXXXXXXXXXXXXXXXXXX",
];

/// The rectangular ghost pen (inclusive bounds) and its single gate door.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GhostHouse {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub gate: Cell,
}

impl GhostHouse {
    /// Cell directly above the gate: where exiting ghosts turn free and
    /// returning ghosts start their descent.
    pub fn exit_waypoint(&self) -> Cell {
        Cell::new(self.gate.row - 1, self.gate.col)
    }

    /// Row where waiting ghosts rest.
    pub fn rest_row(&self) -> i32 {
        self.top + (self.bottom - self.top + 1) / 2
    }

    pub fn slot_col(&self, slot: HomeSlot) -> i32 {
        match slot {
            HomeSlot::Center => self.gate.col,
            HomeSlot::Left => self.gate.col - HOUSE_SLOT_SPACING,
            HomeSlot::Right => self.gate.col + HOUSE_SLOT_SPACING,
        }
    }

    pub fn slot_cell(&self, slot: HomeSlot) -> Cell {
        Cell::new(self.rest_row(), self.slot_col(slot))
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row >= self.top && cell.row <= self.bottom && cell.col >= self.left && cell.col <= self.right
    }
}

#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<TileKind>,
    portal_rows: BTreeSet<i32>,
    house: GhostHouse,
    player_start: Cell,
    dots_left: u32,
}

impl Grid {
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, GridError> {
        if rows.is_empty() {
            return Err(GridError::EmptyLayout);
        }
        let width = rows[0].as_ref().chars().count();
        if width == 0 {
            return Err(GridError::EmptyLayout);
        }

        let mut tiles = Vec::with_capacity(width * rows.len());
        let mut house_cells = Vec::new();
        let mut gates = Vec::new();
        let mut starts = Vec::new();
        let mut portals: Vec<(usize, usize)> = Vec::new();

        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(GridError::RaggedRows {
                    row,
                    expected: width,
                    found,
                });
            }
            for (col, symbol) in line.chars().enumerate() {
                let kind = match symbol {
                    'X' => TileKind::Wall,
                    ' ' => TileKind::Open,
                    '.' => TileKind::Dot,
                    'o' => TileKind::PowerDot,
                    'T' => TileKind::Portal,
                    '-' => TileKind::GateDoor,
                    'H' => TileKind::HouseInterior,
                    'P' => TileKind::Open,
                    _ => return Err(GridError::UnknownTile { row, col, symbol }),
                };
                let cell = Cell::new(row as i32, col as i32);
                match symbol {
                    'H' => house_cells.push(cell),
                    '-' => gates.push(cell),
                    'P' => starts.push(cell),
                    'T' => portals.push((row, col)),
                    _ => {}
                }
                tiles.push(kind);
            }
        }

        let mut portal_rows = BTreeSet::new();
        for &(row, col) in &portals {
            if col != 0 && col != width - 1 {
                return Err(GridError::MisplacedPortal { row, col });
            }
            let partner = if col == 0 { width - 1 } else { 0 };
            if !portals.contains(&(row, partner)) {
                return Err(GridError::UnpairedPortal { row });
            }
            portal_rows.insert(row as i32);
        }

        let house = locate_house(&house_cells, &gates)?;

        let player_start = match starts.as_slice() {
            [] => return Err(GridError::MissingPlayerStart),
            [start] => *start,
            many => return Err(GridError::DuplicatePlayerStart(many.len())),
        };

        let dots_left = tiles
            .iter()
            .filter(|kind| matches!(kind, TileKind::Dot | TileKind::PowerDot))
            .count() as u32;

        let grid = Self {
            width: width as i32,
            height: rows.len() as i32,
            tiles,
            portal_rows,
            house,
            player_start,
            dots_left,
        };

        let exit = house.exit_waypoint();
        if grid.out_of_bounds(exit.row, exit.col) || grid.is_blocked(exit.row, exit.col, false) {
            return Err(GridError::BlockedGateExit {
                row: exit.row,
                col: exit.col,
            });
        }
        Ok(grid)
    }

    pub fn classic() -> Result<Self, GridError> {
        Self::parse(&CLASSIC_LAYOUT)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn house(&self) -> &GhostHouse {
        &self.house
    }

    pub fn player_start(&self) -> Cell {
        self.player_start
    }

    pub fn is_portal_row(&self, row: i32) -> bool {
        self.portal_rows.contains(&row)
    }

    pub fn portal_rows(&self) -> impl Iterator<Item = i32> + '_ {
        self.portal_rows.iter().copied()
    }

    pub fn dots_remaining(&self) -> u32 {
        self.dots_left
    }

    /// Out-of-range rows read as walls; out-of-range columns wrap on portal
    /// rows and read as walls elsewhere.
    pub fn tile_kind_at(&self, row: i32, col: i32) -> TileKind {
        if row < 0 || row >= self.height {
            return TileKind::Wall;
        }
        let col = if col < 0 || col >= self.width {
            if !self.is_portal_row(row) {
                return TileKind::Wall;
            }
            col.rem_euclid(self.width)
        } else {
            col
        };
        self.tiles[self.index(row, col)]
    }

    pub fn is_blocked(&self, row: i32, col: i32, house_access: bool) -> bool {
        match self.tile_kind_at(row, col) {
            TileKind::Wall => true,
            TileKind::GateDoor | TileKind::HouseInterior => !house_access,
            _ => false,
        }
    }

    pub fn consume_dot_at(&mut self, row: i32, col: i32) -> Option<DotKind> {
        if self.out_of_bounds(row, col) {
            return None;
        }
        let idx = self.index(row, col);
        let eaten = match self.tiles[idx] {
            TileKind::Dot => DotKind::Small,
            TileKind::PowerDot => DotKind::Power,
            _ => return None,
        };
        self.tiles[idx] = TileKind::Open;
        self.dots_left = self.dots_left.saturating_sub(1);
        Some(eaten)
    }

    /// Wrap-around entry for an agent leaving the grid through a portal row.
    pub fn portal_exit(
        &self,
        row: i32,
        col: i32,
        direction: Direction,
        tile_size: i32,
    ) -> Option<Position> {
        if !self.is_portal_row(row) {
            return None;
        }
        let col = match direction {
            Direction::Left if col <= 0 => self.width - 1,
            Direction::Right if col >= self.width - 1 => 0,
            _ => return None,
        };
        Some(Position::of_cell(Cell::new(row, col), tile_size))
    }

    /// Cells from `from` (inclusive) in `dir` before a wall, following portal
    /// wrap and capped at one full lap.
    pub fn wall_run(&self, from: Cell, dir: Direction) -> u32 {
        let limit = self.width.max(self.height) as u32;
        let mut cell = from;
        let mut count = 0;
        while count < limit && self.tile_kind_at(cell.row, cell.col) != TileKind::Wall {
            count += 1;
            cell = cell.step(dir);
        }
        count
    }

    pub fn dot_cells(&self) -> impl Iterator<Item = (Cell, DotKind)> + '_ {
        self.tiles.iter().enumerate().filter_map(|(idx, kind)| {
            let cell = Cell::new(idx as i32 / self.width, idx as i32 % self.width);
            match kind {
                TileKind::Dot => Some((cell, DotKind::Small)),
                TileKind::PowerDot => Some((cell, DotKind::Power)),
                _ => None,
            }
        })
    }

    pub fn contains_position(&self, pos: Position, tile_size: i32) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width * tile_size && pos.y < self.height * tile_size
    }

    fn out_of_bounds(&self, row: i32, col: i32) -> bool {
        row < 0 || col < 0 || row >= self.height || col >= self.width
    }

    fn index(&self, row: i32, col: i32) -> usize {
        (row * self.width + col) as usize
    }
}

fn locate_house(house_cells: &[Cell], gates: &[Cell]) -> Result<GhostHouse, GridError> {
    let Some(first) = house_cells.first() else {
        return Err(GridError::MissingGhostHouse);
    };
    let (mut top, mut left, mut bottom, mut right) = (first.row, first.col, first.row, first.col);
    for cell in house_cells {
        top = top.min(cell.row);
        bottom = bottom.max(cell.row);
        left = left.min(cell.col);
        right = right.max(cell.col);
    }
    let area = ((bottom - top + 1) * (right - left + 1)) as usize;
    if area != house_cells.len() {
        return Err(GridError::NonRectangularHouse);
    }

    let gate = match gates {
        [] => return Err(GridError::MissingGate),
        [gate] => *gate,
        many => return Err(GridError::DuplicateGate(many.len())),
    };
    if gate.row != top - 1 || gate.col < left || gate.col > right {
        return Err(GridError::MisplacedGate {
            row: gate.row,
            col: gate.col,
        });
    }
    if gate.col - HOUSE_SLOT_SPACING < left || gate.col + HOUSE_SLOT_SPACING > right {
        return Err(GridError::HouseTooNarrow { gate_col: gate.col });
    }

    Ok(GhostHouse {
        top,
        left,
        bottom,
        right,
        gate,
    })
}
