pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const TILE_SIZE: i32 = 8;
pub const PLAYER_SPEED: i32 = 2;
pub const GHOST_SPEED: i32 = 2;
pub const COLLISION_MARGIN: i32 = 2;

pub const FRIGHTENED_TICKS: u32 = 120;
pub const FLASH_FROM_TICK: u32 = 80;

pub const GHOST_START_DELAY_TICKS: u32 = 20;
pub const FIRST_RELEASE_TICKS: u32 = 140;
pub const RELEASE_INTERVAL_TICKS: u32 = 80;
pub const RESTART_DELAY_TICKS: u32 = 8;

pub const DOT_POINTS: u32 = 10;
pub const POWER_DOT_POINTS: u32 = 50;
pub const GHOST_POINTS: u32 = 200;

pub const MOUTH_FRAME_TICKS: u32 = 3;
pub const POWER_DOT_BLINK_TICKS: u32 = 9;

/// Column distance between the center house slot and the side slots.
pub const HOUSE_SLOT_SPACING: i32 = 2;

pub const GHOST_COUNT: usize = 4;
