use crate::types::{Cell, Direction, GhostColor, GhostMode, HomeSlot, Orientation, Position};

/// Motion state shared by the player and every ghost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    pub position: Position,
    pub direction: Direction,
    pub cached_direction: Option<Direction>,
    /// Signed step applied along `direction`'s axis each tick; 0 when halted.
    pub speed: i32,
    pub speed_magnitude: i32,
    pub orientation: Orientation,
}

impl Agent {
    /// A halted agent standing on `cell`.
    pub fn at_cell(cell: Cell, direction: Direction, speed_magnitude: i32, tile_size: i32) -> Self {
        Self {
            position: Position::of_cell(cell, tile_size),
            direction,
            cached_direction: None,
            speed: 0,
            speed_magnitude,
            orientation: Orientation::facing(direction),
        }
    }

    pub fn cell(&self, tile_size: i32) -> Cell {
        Cell::new(
            self.position.y.div_euclid(tile_size),
            self.position.x.div_euclid(tile_size),
        )
    }

    /// Cell containing the agent's center point.
    pub fn center_cell(&self, tile_size: i32) -> Cell {
        let half = tile_size / 2;
        Cell::new(
            (self.position.y + half).div_euclid(tile_size),
            (self.position.x + half).div_euclid(tile_size),
        )
    }

    pub fn is_aligned(&self, tile_size: i32) -> bool {
        self.position.x.rem_euclid(tile_size) == 0 && self.position.y.rem_euclid(tile_size) == 0
    }

    pub fn is_moving(&self) -> bool {
        self.speed != 0
    }

    pub fn launch(&mut self) {
        self.speed = self.direction.sign() * self.speed_magnitude;
    }

    pub fn halt(&mut self) {
        self.speed = 0;
    }

    /// Speed is either zero or points along the current direction.
    pub fn motion_is_consistent(&self) -> bool {
        self.speed == 0 || self.speed == self.direction.sign() * self.speed_magnitude
    }

    pub fn bounding_box(&self, tile_size: i32, margin: i32) -> BoundingBox {
        BoundingBox {
            left: self.position.x + margin,
            top: self.position.y + margin,
            right: self.position.x + tile_size - margin,
            bottom: self.position.y + tile_size - margin,
        }
    }
}

/// Half-open box `[left, right) x [top, bottom)` in sub-tile units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerAgent {
    pub agent: Agent,
    pub dots_eaten: u32,
}

impl PlayerAgent {
    pub fn spawn(cell: Cell, speed_magnitude: i32, tile_size: i32) -> Self {
        Self {
            agent: Agent::at_cell(cell, Direction::Left, speed_magnitude, tile_size),
            dots_eaten: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GhostAgent {
    pub agent: Agent,
    pub color: GhostColor,
    pub home_slot: HomeSlot,
    mode: GhostMode,
}

impl GhostAgent {
    pub fn spawn(color: GhostColor, mode: GhostMode, home_slot: HomeSlot, agent: Agent) -> Self {
        Self {
            agent,
            color,
            home_slot,
            mode,
        }
    }

    pub fn id(&self) -> &'static str {
        self.color.id()
    }

    pub fn mode(&self) -> GhostMode {
        self.mode
    }

    /// Moves along one edge of the mode graph and returns the previous mode.
    ///
    /// Panics on an edge outside the graph: that is a logic error in the
    /// caller, not a recoverable game state.
    pub fn set_mode(&mut self, next: GhostMode) -> GhostMode {
        assert!(
            self.mode.can_transition_to(next),
            "illegal ghost mode transition for {}: {:?} -> {:?}",
            self.id(),
            self.mode,
            next
        );
        std::mem::replace(&mut self.mode, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_and_alignment_follow_tile_size() {
        let mut agent = Agent::at_cell(Cell::new(3, 5), Direction::Right, 2, 8);
        assert_eq!(agent.position, Position { x: 40, y: 24 });
        assert!(agent.is_aligned(8));
        agent.position.x += 6;
        assert!(!agent.is_aligned(8));
        assert_eq!(agent.cell(8), Cell::new(3, 5));
        assert_eq!(agent.center_cell(8), Cell::new(3, 6));
    }

    #[test]
    fn launch_points_speed_along_direction() {
        let mut agent = Agent::at_cell(Cell::new(1, 1), Direction::Up, 2, 8);
        assert!(!agent.is_moving());
        agent.launch();
        assert_eq!(agent.speed, -2);
        assert!(agent.motion_is_consistent());
        agent.direction = Direction::Down;
        assert!(!agent.motion_is_consistent());
        agent.halt();
        assert!(agent.motion_is_consistent());
    }

    #[test]
    fn boxes_touching_at_an_edge_do_not_overlap() {
        let a = Agent::at_cell(Cell::new(1, 1), Direction::Left, 2, 8);
        let mut b = Agent::at_cell(Cell::new(1, 2), Direction::Left, 2, 8);
        b.position.x -= 4;
        let (ba, bb) = (a.bounding_box(8, 2), b.bounding_box(8, 2));
        assert_eq!(ba.right, bb.left);
        assert!(!ba.overlaps(&bb));
        b.position.x -= 1;
        assert!(a.bounding_box(8, 2).overlaps(&b.bounding_box(8, 2)));
    }

    #[test]
    fn ghost_mode_follows_the_graph() {
        let agent = Agent::at_cell(Cell::new(1, 1), Direction::Left, 2, 8);
        let mut ghost = GhostAgent::spawn(GhostColor::Red, GhostMode::Free, HomeSlot::Center, agent);
        assert_eq!(ghost.set_mode(GhostMode::Frightened), GhostMode::Free);
        assert_eq!(ghost.set_mode(GhostMode::Eaten), GhostMode::Frightened);
        assert_eq!(ghost.mode(), GhostMode::Eaten);
    }

    #[test]
    #[should_panic(expected = "illegal ghost mode transition")]
    fn ghost_mode_rejects_shortcuts() {
        let agent = Agent::at_cell(Cell::new(1, 1), Direction::Left, 2, 8);
        let mut ghost =
            GhostAgent::spawn(GhostColor::Pink, GhostMode::InHouse, HomeSlot::Center, agent);
        ghost.set_mode(GhostMode::Free);
    }
}
