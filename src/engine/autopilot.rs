use super::*;

/// Chasing ghosts closer than this (in cells) make a cell off limits.
const DANGER_RADIUS: i32 = 1;

impl GameEngine {
    /// Input a simple bot would press this tick, or `None` to keep going.
    ///
    /// Hunts frightened ghosts while any are about, otherwise walks the
    /// shortest ghost-free path to the nearest dot.
    pub fn autopilot_direction<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Option<Direction> {
        let tile_size = self.config.tile_size;
        let player = self.player.as_ref()?;
        if !player.agent.is_aligned(tile_size) {
            return None;
        }
        let from = player.agent.cell(tile_size);

        let chasers: Vec<Cell> = self
            .ghosts
            .iter()
            .filter(|ghost| ghost.mode() == GhostMode::Free)
            .map(|ghost| ghost.agent.center_cell(tile_size))
            .collect();
        let prey: HashSet<Cell> = self
            .ghosts
            .iter()
            .filter(|ghost| ghost.mode() == GhostMode::Frightened)
            .map(|ghost| ghost.agent.center_cell(tile_size))
            .collect();
        let targets: HashSet<Cell> = if prey.is_empty() {
            self.grid.dot_cells().map(|(cell, _)| cell).collect()
        } else {
            prey
        };

        if rng.pick_index(32) == 0 {
            let dir = random_direction(rng);
            let next = neighbor(&self.grid, from, dir);
            if !self.grid.is_blocked(next.row, next.col, false) && !near(&chasers, next) {
                return Some(dir);
            }
        }

        self.first_step_toward(from, &targets, &chasers)
            .or_else(|| self.escape_direction(from, &chasers))
    }

    fn first_step_toward(
        &self,
        from: Cell,
        targets: &HashSet<Cell>,
        chasers: &[Cell],
    ) -> Option<Direction> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(from);
        for dir in Direction::ALL {
            let next = neighbor(&self.grid, from, dir);
            if self.grid.is_blocked(next.row, next.col, false) || near(chasers, next) {
                continue;
            }
            if seen.insert(next) {
                queue.push_back((next, dir));
            }
        }

        while let Some((cell, first)) = queue.pop_front() {
            if targets.contains(&cell) {
                return Some(first);
            }
            for dir in Direction::ALL {
                let next = neighbor(&self.grid, cell, dir);
                if self.grid.is_blocked(next.row, next.col, false) || near(chasers, next) {
                    continue;
                }
                if seen.insert(next) {
                    queue.push_back((next, first));
                }
            }
        }
        None
    }

    fn escape_direction(&self, from: Cell, chasers: &[Cell]) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| {
                let next = neighbor(&self.grid, from, *dir);
                !self.grid.is_blocked(next.row, next.col, false)
            })
            .max_by_key(|dir| {
                let next = neighbor(&self.grid, from, *dir);
                chasers
                    .iter()
                    .map(|ghost| manhattan(*ghost, next))
                    .min()
                    .unwrap_or(i32::MAX)
            })
    }
}

fn near(chasers: &[Cell], cell: Cell) -> bool {
    chasers
        .iter()
        .any(|ghost| manhattan(*ghost, cell) <= DANGER_RADIUS)
}
