use serde::{Deserialize, Serialize};

use crate::constants::{
    COLLISION_MARGIN, DOT_POINTS, FIRST_RELEASE_TICKS, FLASH_FROM_TICK, FRIGHTENED_TICKS,
    GHOST_POINTS, GHOST_SPEED, GHOST_START_DELAY_TICKS, MOUTH_FRAME_TICKS, PLAYER_SPEED,
    POWER_DOT_BLINK_TICKS, POWER_DOT_POINTS, RELEASE_INTERVAL_TICKS, RESTART_DELAY_TICKS,
    TICK_MS, TILE_SIZE,
};
use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Candidate order used wherever directions are enumerated.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "up" | "w" => Some(Self::Up),
            "down" | "s" => Some(Self::Down),
            "left" | "a" => Some(Self::Left),
            "right" | "d" => Some(Self::Right),
            _ => None,
        }
    }

    /// Maps browser-style key codes (arrows and WASD) to a direction.
    pub fn from_key_code(code: u32) -> Option<Self> {
        match code {
            38 | 87 => Some(Self::Up),
            40 | 83 => Some(Self::Down),
            37 | 65 => Some(Self::Left),
            39 | 68 => Some(Self::Right),
            _ => None,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Unit step as `(d_row, d_col)`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn sign(self) -> i32 {
        match self {
            Self::Up | Self::Left => -1,
            Self::Down | Self::Right => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Wall,
    Open,
    Dot,
    PowerDot,
    Portal,
    GateDoor,
    HouseInterior,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DotKind {
    Small,
    Power,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (d_row, d_col) = dir.delta();
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }
}

/// Sub-tile coordinates of an agent's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn of_cell(cell: Cell, tile_size: i32) -> Self {
        Self {
            x: cell.col * tile_size,
            y: cell.row * tile_size,
        }
    }
}

/// Render-only facing hint: a clockwise rotation plus an optional horizontal mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Orientation {
    pub rotation: u16,
    pub mirrored: bool,
}

impl Orientation {
    pub const RIGHT: Self = Self::new(0, false);
    pub const LEFT: Self = Self::new(0, true);
    pub const UP: Self = Self::new(90, true);
    pub const DOWN: Self = Self::new(90, false);
    pub const DOWN_FROM_LEFT: Self = Self::new(270, true);
    pub const UP_FROM_RIGHT: Self = Self::new(270, false);

    const fn new(rotation: u16, mirrored: bool) -> Self {
        Self { rotation, mirrored }
    }

    pub fn facing(dir: Direction) -> Self {
        match dir {
            Direction::Right => Self::RIGHT,
            Direction::Left => Self::LEFT,
            Direction::Up => Self::UP,
            Direction::Down => Self::DOWN,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    InHouse,
    Reshuffling,
    Exiting,
    Free,
    Frightened,
    Eaten,
    Returning,
    Entering,
}

impl GhostMode {
    pub const ALL: [GhostMode; 8] = [
        GhostMode::InHouse,
        GhostMode::Reshuffling,
        GhostMode::Exiting,
        GhostMode::Free,
        GhostMode::Frightened,
        GhostMode::Eaten,
        GhostMode::Returning,
        GhostMode::Entering,
    ];

    pub fn can_transition_to(self, next: GhostMode) -> bool {
        use GhostMode::*;
        matches!(
            (self, next),
            (InHouse, Exiting)
                | (InHouse, Reshuffling)
                | (Reshuffling, InHouse)
                | (Exiting, Free)
                | (Free, Frightened)
                | (Frightened, Free)
                | (Free, Eaten)
                | (Frightened, Eaten)
                | (Eaten, Returning)
                | (Returning, Entering)
                | (Entering, InHouse)
        )
    }

    /// Modes allowed to cross the gate and stand inside the house.
    pub fn has_house_access(self) -> bool {
        matches!(
            self,
            GhostMode::InHouse | GhostMode::Reshuffling | GhostMode::Exiting | GhostMode::Entering
        )
    }

    pub fn is_collidable(self) -> bool {
        matches!(self, GhostMode::Free | GhostMode::Frightened)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeSlot {
    Center,
    Left,
    Right,
}

impl HomeSlot {
    /// Exit priority and occupancy order.
    pub const ORDER: [HomeSlot; 3] = [HomeSlot::Center, HomeSlot::Left, HomeSlot::Right];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostColor {
    Red,
    Pink,
    Cyan,
    Orange,
}

impl GhostColor {
    pub fn id(self) -> &'static str {
        match self {
            GhostColor::Red => "ghost_red",
            GhostColor::Pink => "ghost_pink",
            GhostColor::Cyan => "ghost_cyan",
            GhostColor::Orange => "ghost_orange",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Ready,
    Active,
    Paused,
    Won,
    Lost,
    Respawning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub tick_ms: u64,
    pub tile_size: i32,
    pub player_speed: i32,
    pub ghost_speed: i32,
    pub collision_margin: i32,
    pub frightened_ticks: u32,
    pub flash_from_tick: u32,
    pub ghost_start_delay_ticks: u32,
    pub first_release_ticks: u32,
    pub release_interval_ticks: u32,
    pub restart_delay_ticks: u32,
    pub dot_points: u32,
    pub power_dot_points: u32,
    pub ghost_points: u32,
    pub mouth_frame_ticks: u32,
    pub power_dot_blink_ticks: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            tile_size: TILE_SIZE,
            player_speed: PLAYER_SPEED,
            ghost_speed: GHOST_SPEED,
            collision_margin: COLLISION_MARGIN,
            frightened_ticks: FRIGHTENED_TICKS,
            flash_from_tick: FLASH_FROM_TICK,
            ghost_start_delay_ticks: GHOST_START_DELAY_TICKS,
            first_release_ticks: FIRST_RELEASE_TICKS,
            release_interval_ticks: RELEASE_INTERVAL_TICKS,
            restart_delay_ticks: RESTART_DELAY_TICKS,
            dot_points: DOT_POINTS,
            power_dot_points: POWER_DOT_POINTS,
            ghost_points: GHOST_POINTS,
            mouth_frame_ticks: MOUTH_FRAME_TICKS,
            power_dot_blink_ticks: POWER_DOT_BLINK_TICKS,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTickDuration);
        }
        if self.tile_size <= 0 {
            return Err(ConfigError::NonPositiveTileSize(self.tile_size));
        }
        for (agent, speed) in [("player", self.player_speed), ("ghost", self.ghost_speed)] {
            if speed <= 0 || speed > self.tile_size || self.tile_size % speed != 0 {
                return Err(ConfigError::SpeedDoesNotDivideTile {
                    agent,
                    speed,
                    tile_size: self.tile_size,
                });
            }
        }
        if self.collision_margin < 0 || self.collision_margin * 2 >= self.tile_size {
            return Err(ConfigError::CollisionMarginOutOfRange {
                margin: self.collision_margin,
                tile_size: self.tile_size,
            });
        }
        // Head-on agents close in by both speeds each tick.
        let combined = self.player_speed + self.ghost_speed;
        let limit = 2 * (self.tile_size - 2 * self.collision_margin);
        if combined >= limit {
            return Err(ConfigError::SpeedsSkipCollision { combined, limit });
        }
        if self.frightened_ticks == 0 || self.flash_from_tick > self.frightened_ticks {
            return Err(ConfigError::FlashAfterExpiry {
                flash_from_tick: self.flash_from_tick,
                frightened_ticks: self.frightened_ticks,
            });
        }
        if self.release_interval_ticks == 0 {
            return Err(ConfigError::ZeroInterval("releaseIntervalTicks"));
        }
        if self.mouth_frame_ticks == 0 {
            return Err(ConfigError::ZeroInterval("mouthFrameTicks"));
        }
        if self.power_dot_blink_ticks == 0 {
            return Err(ConfigError::ZeroInterval("powerDotBlinkTicks"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub row: i32,
    pub col: i32,
    pub dir: Direction,
    pub orientation: Orientation,
    pub speed: i32,
    pub cached_dir: Option<Direction>,
    pub dots_eaten: u32,
    pub mouth_open: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostView {
    pub id: String,
    pub color: GhostColor,
    pub x: i32,
    pub y: i32,
    pub row: i32,
    pub col: i32,
    pub dir: Direction,
    pub orientation: Orientation,
    pub speed: i32,
    pub mode: GhostMode,
    pub home_slot: HomeSlot,
    pub flashing: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    DotEaten {
        kind: DotKind,
        row: i32,
        col: i32,
        score: u32,
        #[serde(rename = "dotsRemaining")]
        dots_remaining: u32,
    },
    GhostEaten {
        #[serde(rename = "ghostId")]
        ghost_id: String,
        points: u32,
        score: u32,
    },
    PlayerCaught {
        #[serde(rename = "ghostId")]
        ghost_id: String,
        score: u32,
        catches: u32,
    },
    LevelCleared {
        score: u32,
        #[serde(rename = "dotsEaten")]
        dots_eaten: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeTransition {
    pub tick: u64,
    pub ghost_id: String,
    pub from: GhostMode,
    pub to: GhostMode,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub tick: u64,
    pub phase: SessionPhase,
    pub score: u32,
    pub dots_remaining: u32,
    pub frightened: bool,
    pub flashing: bool,
    pub power_dots_visible: bool,
    pub player: Option<PlayerView>,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<RuntimeEvent>,
    pub transitions: Vec<ModeTransition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_is_an_involution() {
        for dir in Direction::ALL {
            assert_eq!(dir.reverse().reverse(), dir);
            assert_ne!(dir.reverse(), dir);
            let (r, c) = dir.delta();
            let (rr, rc) = dir.reverse().delta();
            assert_eq!((r + rr, c + rc), (0, 0));
        }
    }

    #[test]
    fn key_codes_and_names_map_to_directions() {
        assert_eq!(Direction::from_key_code(38), Some(Direction::Up));
        assert_eq!(Direction::from_key_code(68), Some(Direction::Right));
        assert_eq!(Direction::from_key_code(13), None);
        assert_eq!(Direction::parse_move(" Left "), Some(Direction::Left));
        assert_eq!(Direction::parse_move("s"), Some(Direction::Down));
        assert_eq!(Direction::parse_move("jump"), None);
    }

    #[test]
    fn mode_table_has_no_shortcut_out_of_the_house() {
        assert!(!GhostMode::InHouse.can_transition_to(GhostMode::Free));
        assert!(!GhostMode::Returning.can_transition_to(GhostMode::Free));
        assert!(!GhostMode::Eaten.can_transition_to(GhostMode::Frightened));
        assert!(GhostMode::Exiting.can_transition_to(GhostMode::Free));
        for mode in GhostMode::ALL {
            assert!(!mode.can_transition_to(mode));
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn config_rejects_speed_that_skips_tile_boundaries() {
        let config = GameConfig {
            tile_size: 8,
            ghost_speed: 3,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SpeedDoesNotDivideTile {
                agent: "ghost",
                speed: 3,
                tile_size: 8,
            })
        );
    }

    #[test]
    fn config_rejects_speeds_that_skip_the_collision_window() {
        let config = GameConfig {
            tile_size: 8,
            collision_margin: 2,
            player_speed: 4,
            ghost_speed: 4,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SpeedsSkipCollision {
                combined: 8,
                limit: 8,
            })
        );

        let slower = GameConfig {
            ghost_speed: 2,
            ..config
        };
        assert_eq!(slower.validate(), Ok(()));
    }

    #[test]
    fn config_deserializes_partial_json_over_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"tileSize": 4, "playerSpeed": 1}"#).expect("valid json");
        assert_eq!(config.tile_size, 4);
        assert_eq!(config.player_speed, 1);
        assert_eq!(config.frightened_ticks, FRIGHTENED_TICKS);
    }
}
