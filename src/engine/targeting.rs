use super::*;

/// Direction choice for a grid-aligned ghost heading for (or, when
/// `fleeing`, away from) `target`.
pub fn choose_direction<R: RandomSource + ?Sized>(
    grid: &Grid,
    from: Cell,
    heading: Direction,
    target: Cell,
    fleeing: bool,
    house_access: bool,
    rng: &mut R,
) -> Direction {
    let open = |dir: Direction| {
        let next = from.step(dir);
        !grid.is_blocked(next.row, next.col, house_access)
    };
    let candidates: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|dir| *dir != heading.reverse() && open(*dir))
        .collect();

    match candidates.as_slice() {
        [] => {
            return if open(heading.reverse()) {
                heading.reverse()
            } else {
                heading
            };
        }
        [only] => return *only,
        _ => {}
    }

    let (mut row_pref, mut col_pref) = preferred_directions(grid, from, target);
    if fleeing {
        row_pref = row_pref.map(Direction::reverse);
        col_pref = col_pref.map(Direction::reverse);
    }
    let row_pref = row_pref.filter(|dir| candidates.contains(dir));
    let col_pref = col_pref.filter(|dir| candidates.contains(dir));

    match (row_pref, col_pref) {
        (Some(vertical), Some(horizontal)) => {
            let vertical_run = grid.wall_run(from, vertical);
            let horizontal_run = grid.wall_run(from, horizontal);
            match vertical_run.cmp(&horizontal_run) {
                Ordering::Greater => vertical,
                Ordering::Less => horizontal,
                Ordering::Equal => {
                    if rng.coin_flip() {
                        vertical
                    } else {
                        horizontal
                    }
                }
            }
        }
        (Some(dir), None) | (None, Some(dir)) => dir,
        (None, None) => candidates[rng.pick_index(candidates.len())],
    }
}

/// Row and column directions toward `target`, with the column flipped when
/// the ghost sits on a portal row and the wrap-around is shorter.
fn preferred_directions(grid: &Grid, from: Cell, target: Cell) -> (Option<Direction>, Option<Direction>) {
    let row_pref = match target.row.cmp(&from.row) {
        Ordering::Less => Some(Direction::Up),
        Ordering::Greater => Some(Direction::Down),
        Ordering::Equal => None,
    };
    let mut col_pref = match target.col.cmp(&from.col) {
        Ordering::Less => Some(Direction::Left),
        Ordering::Greater => Some(Direction::Right),
        Ordering::Equal => None,
    };
    if grid.is_portal_row(from.row) {
        let width = grid.width();
        let direct = (target.col - from.col).abs();
        let wrapped = target.col.min(width - target.col) + from.col.min(width - from.col);
        if wrapped < direct {
            col_pref = col_pref.map(Direction::reverse);
        }
    }
    (row_pref, col_pref)
}

impl GameEngine {
    /// Cell a roaming ghost steers toward in its current mode.
    pub(super) fn chase_target(&self, mode: GhostMode) -> Option<Cell> {
        let tile_size = self.config.tile_size;
        match mode {
            GhostMode::Free | GhostMode::Frightened => {
                self.player.as_ref().map(|player| player.agent.cell(tile_size))
            }
            GhostMode::Returning => Some(self.grid.house().gate),
            _ => None,
        }
    }

    pub(super) fn steer_roaming_ghost(&mut self, ghost_idx: usize) {
        let tile_size = self.config.tile_size;
        let ghost = &self.ghosts[ghost_idx];
        let mode = ghost.mode();
        if !ghost.agent.is_aligned(tile_size) {
            return;
        }
        let Some(target) = self.chase_target(mode) else {
            return;
        };
        let from = ghost.agent.cell(tile_size);
        let heading = ghost.agent.direction;
        let choice = choose_direction(
            &self.grid,
            from,
            heading,
            target,
            mode == GhostMode::Frightened,
            mode.has_house_access(),
            &mut self.rng,
        );
        self.ghosts[ghost_idx].agent.cached_direction = Some(choice);
    }
}
