use super::*;

impl GameEngine {
    /// Scripted path for ghosts crossing or shuffling inside the house.
    pub(super) fn steer_house_ghost(&mut self, ghost_idx: usize) {
        let tile_size = self.config.tile_size;
        let house = *self.grid.house();
        let ghost = &mut self.ghosts[ghost_idx];
        if !ghost.agent.is_aligned(tile_size) {
            return;
        }
        let cell = ghost.agent.cell(tile_size);
        let toward = |col: i32| match col.cmp(&cell.col) {
            Ordering::Less => Some(Direction::Left),
            Ordering::Greater => Some(Direction::Right),
            Ordering::Equal => None,
        };
        let wanted = match ghost.mode() {
            GhostMode::Exiting => toward(house.gate.col).or(Some(Direction::Up)),
            GhostMode::Entering => Some(Direction::Down),
            GhostMode::Reshuffling => toward(house.slot_col(ghost.home_slot)),
            _ => None,
        };
        if wanted.is_some() {
            ghost.agent.cached_direction = wanted;
        }
    }

    /// Applies the waypoint-driven transitions once a ghost stands on the
    /// cell that ends its current leg.
    pub(super) fn settle_house_arrival(&mut self, ghost_idx: usize) {
        let tile_size = self.config.tile_size;
        let house = *self.grid.house();
        let ghost = &self.ghosts[ghost_idx];
        if !ghost.agent.is_aligned(tile_size) {
            return;
        }
        let cell = ghost.agent.cell(tile_size);
        match ghost.mode() {
            GhostMode::Exiting if cell == house.exit_waypoint() => {
                self.transition_ghost(ghost_idx, GhostMode::Free);
            }
            GhostMode::Returning if cell == house.exit_waypoint() => {
                self.transition_ghost(ghost_idx, GhostMode::Entering);
            }
            GhostMode::Entering if cell.row >= house.rest_row() => {
                self.ghosts[ghost_idx].agent.halt();
                self.transition_ghost(ghost_idx, GhostMode::InHouse);
                let slot = self.free_home_slot(ghost_idx);
                self.ghosts[ghost_idx].home_slot = slot;
                if house.slot_col(slot) != cell.col {
                    self.transition_ghost(ghost_idx, GhostMode::Reshuffling);
                }
            }
            GhostMode::Reshuffling if cell.col == house.slot_col(ghost.home_slot) => {
                self.ghosts[ghost_idx].agent.halt();
                self.ghosts[ghost_idx].agent.cached_direction = None;
                self.transition_ghost(ghost_idx, GhostMode::InHouse);
                if self.session.pending_release == Some(ghost_idx) {
                    self.session.pending_release = None;
                    self.transition_ghost(ghost_idx, GhostMode::Exiting);
                }
            }
            _ => {}
        }
    }

    /// First slot in Center, Left, Right order that no other waiting ghost
    /// holds. A full house stacks the newcomer on the center slot.
    fn free_home_slot(&self, ghost_idx: usize) -> HomeSlot {
        let taken: Vec<HomeSlot> = self
            .ghosts
            .iter()
            .enumerate()
            .filter(|(idx, ghost)| {
                *idx != ghost_idx
                    && matches!(ghost.mode(), GhostMode::InHouse | GhostMode::Reshuffling)
            })
            .map(|(_, ghost)| ghost.home_slot)
            .collect();
        HomeSlot::ORDER
            .into_iter()
            .find(|slot| !taken.contains(slot))
            .unwrap_or(HomeSlot::Center)
    }

    /// Sends out the center ghost, or walks a side ghost to the center and
    /// releases it on arrival.
    pub(super) fn release_next_ghost(&mut self) {
        if self.session.pending_release.is_some() {
            return;
        }
        let waiting = |slot: HomeSlot| {
            self.ghosts
                .iter()
                .position(|ghost| ghost.mode() == GhostMode::InHouse && ghost.home_slot == slot)
        };
        let center = waiting(HomeSlot::Center);
        let side = waiting(HomeSlot::Left).or_else(|| waiting(HomeSlot::Right));
        if let Some(idx) = center {
            self.transition_ghost(idx, GhostMode::Exiting);
        } else if let Some(idx) = side {
            self.ghosts[idx].home_slot = HomeSlot::Center;
            self.transition_ghost(idx, GhostMode::Reshuffling);
            self.session.pending_release = Some(idx);
        }
    }
}
