use super::*;

/// What the resolver did to an agent during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub turned: bool,
    pub halted: bool,
    pub wrapped: bool,
}

/// One tick of motion: cached turn, halt at walls, advance, portal wrap.
pub fn resolve(agent: &mut Agent, grid: &Grid, tile_size: i32, house_access: bool) -> ResolveOutcome {
    let mut outcome = ResolveOutcome::default();
    let aligned = agent.is_aligned(tile_size);
    let cell = agent.cell(tile_size);

    if let Some(wanted) = agent.cached_direction {
        let next = cell.step(wanted);
        if aligned && !grid.is_blocked(next.row, next.col, house_access) {
            agent.orientation = turn_orientation(agent.direction, wanted, agent.orientation);
            agent.direction = wanted;
            agent.cached_direction = None;
            agent.launch();
            outcome.turned = true;
        }
    }

    if !outcome.turned && aligned {
        let ahead = cell.step(agent.direction);
        if grid.is_blocked(ahead.row, ahead.col, house_access) {
            if agent.is_moving() {
                outcome.halted = true;
            }
            agent.halt();
            agent.cached_direction = None;
        }
    }

    if agent.speed != 0 {
        if agent.direction.is_horizontal() {
            agent.position.x += agent.speed;
        } else {
            agent.position.y += agent.speed;
        }
    }

    if agent.direction.is_horizontal() {
        let row = agent.position.y.div_euclid(tile_size);
        let right_edge = (grid.width() - 1) * tile_size;
        let exit = match agent.direction {
            Direction::Left if agent.position.x < 0 => grid.portal_exit(row, 0, Direction::Left, tile_size),
            Direction::Right if agent.position.x > right_edge => {
                grid.portal_exit(row, grid.width() - 1, Direction::Right, tile_size)
            }
            _ => None,
        };
        if let Some(entry) = exit {
            agent.position = entry;
            outcome.wrapped = true;
        }
    }

    outcome
}

/// Facing hint after a turn. Same-axis reversals keep the mirrored sprite
/// picked by the preceding diagonal turn.
pub fn turn_orientation(from: Direction, to: Direction, current: Orientation) -> Orientation {
    match (from, to) {
        (Direction::Left, Direction::Down) => Orientation::DOWN_FROM_LEFT,
        (Direction::Right, Direction::Down) => Orientation::DOWN,
        (Direction::Left, Direction::Up) => Orientation::UP,
        (Direction::Right, Direction::Up) => Orientation::UP_FROM_RIGHT,
        (Direction::Down, Direction::Up) if current == Orientation::DOWN_FROM_LEFT => {
            Orientation::UP_FROM_RIGHT
        }
        (Direction::Up, Direction::Down) if current == Orientation::UP => Orientation::DOWN,
        _ => Orientation::facing(to),
    }
}

impl GameEngine {
    pub(super) fn move_player(&mut self) {
        let tile_size = self.config.tile_size;
        if let Some(player) = self.player.as_mut() {
            resolve(&mut player.agent, &self.grid, tile_size, false);
        }
    }

    /// Ghosts move in roster order, each after the player, so chasers see
    /// this tick's player cell.
    pub(super) fn move_ghosts(&mut self) {
        let tile_size = self.config.tile_size;
        for idx in 0..self.ghosts.len() {
            self.settle_house_arrival(idx);
            let mode = self.ghosts[idx].mode();
            match mode {
                GhostMode::InHouse | GhostMode::Eaten => continue,
                GhostMode::Free | GhostMode::Frightened | GhostMode::Returning => {
                    self.steer_roaming_ghost(idx)
                }
                GhostMode::Exiting | GhostMode::Entering | GhostMode::Reshuffling => {
                    self.steer_house_ghost(idx)
                }
            }
            resolve(
                &mut self.ghosts[idx].agent,
                &self.grid,
                tile_size,
                mode.has_house_access(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::types::Position;
    use crate::world::tests::SMALL_LAYOUT;

    fn small() -> Grid {
        Grid::parse(&SMALL_LAYOUT).expect("small layout is valid")
    }

    fn launched(cell: Cell, dir: Direction, speed: i32, tile_size: i32) -> Agent {
        let mut agent = Agent::at_cell(cell, dir, speed, tile_size);
        agent.launch();
        agent
    }

    #[test]
    fn four_ticks_at_quarter_tile_speed_land_on_next_cell() {
        let grid = Grid::parse(&[
            "XXXXXXXXXXX",
            "X....P....X",
            "X.XXX XXX.X",
            "X.XXX-XXX.X",
            "X.XHHHHHX.X",
            "XXXXXXXXXXX",
        ])
        .expect("layout is valid");
        let mut agent = Agent::at_cell(grid.player_start(), Direction::Left, 1, 4);
        agent.cached_direction = Some(Direction::Right);
        for tick in 0..4 {
            resolve(&mut agent, &grid, 4, false);
            if tick < 3 {
                assert!(!agent.is_aligned(4));
            }
        }
        assert!(agent.is_aligned(4));
        assert_eq!(agent.cell(4), Cell::new(1, 6));
        assert_eq!(agent.direction, Direction::Right);
        assert_eq!(agent.cached_direction, None);
    }

    #[test]
    fn blocked_cache_is_kept_until_the_turn_opens() {
        let grid = small();
        let mut agent = launched(Cell::new(1, 3), Direction::Right, 2, 8);
        agent.cached_direction = Some(Direction::Down);
        let outcome = resolve(&mut agent, &grid, 8, false);
        assert!(!outcome.turned);
        assert_eq!(agent.cached_direction, Some(Direction::Down));
        for _ in 0..3 {
            resolve(&mut agent, &grid, 8, false);
        }
        assert_eq!(agent.cell(8), Cell::new(1, 4));
        assert!(agent.is_aligned(8));
        let outcome = resolve(&mut agent, &grid, 8, false);
        assert!(!outcome.turned);
        for _ in 0..3 {
            resolve(&mut agent, &grid, 8, false);
        }
        assert_eq!(agent.position, Position { x: 40, y: 8 });
        let outcome = resolve(&mut agent, &grid, 8, false);
        assert!(outcome.turned);
        assert_eq!(agent.direction, Direction::Down);
        assert_eq!(agent.orientation, Orientation::DOWN);
        assert_eq!(agent.position, Position { x: 40, y: 10 });
    }

    #[test]
    fn cached_side_branch_beats_open_reverse_at_junction() {
        let grid = small();
        // (1,5) opens left, right and down.
        let mut agent = launched(Cell::new(1, 5), Direction::Left, 2, 8);
        agent.cached_direction = Some(Direction::Down);
        assert!(!grid.is_blocked(1, 6, false));

        let outcome = resolve(&mut agent, &grid, 8, false);
        assert!(outcome.turned);
        assert_eq!(agent.direction, Direction::Down);
        assert_eq!(agent.cached_direction, None);
        assert_eq!(agent.orientation, Orientation::DOWN_FROM_LEFT);
        assert_eq!(agent.position, Position { x: 40, y: 10 });
    }

    #[test]
    fn wall_ahead_halts_and_clears_cache() {
        let grid = small();
        let mut agent = launched(Cell::new(1, 9), Direction::Right, 2, 8);
        agent.cached_direction = Some(Direction::Up);
        let outcome = resolve(&mut agent, &grid, 8, false);
        assert!(outcome.halted);
        assert_eq!(agent.speed, 0);
        assert_eq!(agent.cached_direction, None);
        assert_eq!(agent.position, Position { x: 72, y: 8 });
    }

    #[test]
    fn gate_blocks_unless_house_access() {
        let grid = small();
        let mut player = Agent::at_cell(Cell::new(2, 5), Direction::Up, 2, 8);
        player.cached_direction = Some(Direction::Down);
        assert!(!resolve(&mut player, &grid, 8, false).turned);

        let mut ghost = Agent::at_cell(Cell::new(2, 5), Direction::Up, 2, 8);
        ghost.cached_direction = Some(Direction::Down);
        assert!(resolve(&mut ghost, &grid, 8, true).turned);
    }

    #[test]
    fn reversal_keeps_the_diagonal_sprite() {
        assert_eq!(
            turn_orientation(Direction::Down, Direction::Up, Orientation::DOWN_FROM_LEFT),
            Orientation::UP_FROM_RIGHT
        );
        assert_eq!(
            turn_orientation(Direction::Down, Direction::Up, Orientation::DOWN),
            Orientation::UP
        );
        assert_eq!(
            turn_orientation(Direction::Up, Direction::Down, Orientation::UP),
            Orientation::DOWN
        );
        assert_eq!(
            turn_orientation(Direction::Up, Direction::Left, Orientation::UP),
            Orientation::LEFT
        );
    }

    #[test]
    fn portal_wraps_both_ways_on_the_same_row() {
        let grid = small();
        let mut agent = launched(Cell::new(5, 1), Direction::Left, 2, 8);
        let mut wrapped = false;
        for _ in 0..5 {
            wrapped |= resolve(&mut agent, &grid, 8, false).wrapped;
        }
        assert!(wrapped);
        assert_eq!(agent.position, Position { x: 80, y: 40 });

        agent.cached_direction = Some(Direction::Right);
        let outcome = resolve(&mut agent, &grid, 8, false);
        assert!(outcome.turned && outcome.wrapped);
        assert_eq!(agent.position, Position { x: 0, y: 40 });
    }

    fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    proptest! {
        #[test]
        fn prop_turns_only_happen_when_aligned(
            speed in prop_oneof![Just(1i32), Just(2), Just(4), Just(8)],
            inputs in prop::collection::vec(prop::option::of(arb_direction()), 1..300),
        ) {
            let grid = small();
            let mut agent = Agent::at_cell(grid.player_start(), Direction::Left, speed, 8);
            for input in inputs {
                if input.is_some() {
                    agent.cached_direction = input;
                }
                let aligned_before = agent.is_aligned(8);
                let direction_before = agent.direction;
                let outcome = resolve(&mut agent, &grid, 8, false);
                if outcome.turned || agent.direction != direction_before {
                    prop_assert!(aligned_before);
                }
                prop_assert!(agent.motion_is_consistent());
                prop_assert!(grid.contains_position(agent.position, 8));
                let cell = agent.cell(8);
                prop_assert!(!grid.is_blocked(cell.row, cell.col, false));
            }
        }

        #[test]
        fn prop_portal_round_trip_keeps_row(
            speed in prop_oneof![Just(1i32), Just(2), Just(4), Just(8)],
        ) {
            let grid = small();
            let tile_size = 8;
            let mut agent = launched(Cell::new(5, 1), Direction::Left, speed, tile_size);
            let mut ticks = 0;
            while !resolve(&mut agent, &grid, tile_size, false).wrapped {
                prop_assert_eq!(agent.position.y, 40);
                ticks += 1;
                prop_assert!(ticks < 64);
            }
            prop_assert_eq!(agent.position, Position { x: 80, y: 40 });

            agent.cached_direction = Some(Direction::Right);
            let outcome = resolve(&mut agent, &grid, tile_size, false);
            prop_assert!(outcome.wrapped);
            prop_assert_eq!(agent.position, Position { x: 0, y: 40 });
        }
    }
}
