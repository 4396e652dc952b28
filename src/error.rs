use thiserror::Error;

/// Layout problems that refuse to start a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("layout has no rows")]
    EmptyLayout,
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile {symbol:?} at row {row}, column {col}")]
    UnknownTile { row: usize, col: usize, symbol: char },
    #[error("layout has no ghost house")]
    MissingGhostHouse,
    #[error("ghost house tiles do not form a single rectangle")]
    NonRectangularHouse,
    #[error("layout has no gate door")]
    MissingGate,
    #[error("layout has {0} gate doors, expected one")]
    DuplicateGate(usize),
    #[error("gate door at row {row}, column {col} is not directly above the house")]
    MisplacedGate { row: i32, col: i32 },
    #[error("ghost house is too narrow for three waiting slots around column {gate_col}")]
    HouseTooNarrow { gate_col: i32 },
    #[error("cell above the gate door at row {row}, column {col} is blocked")]
    BlockedGateExit { row: i32, col: i32 },
    #[error("portal on row {row} has no partner on the opposite edge")]
    UnpairedPortal { row: usize },
    #[error("portal at row {row}, column {col} is not on a horizontal edge")]
    MisplacedPortal { row: usize, col: usize },
    #[error("layout has no player start")]
    MissingPlayerStart,
    #[error("layout has {0} player starts, expected one")]
    DuplicatePlayerStart(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("tick duration must be positive")]
    ZeroTickDuration,
    #[error("tile size must be positive, got {0}")]
    NonPositiveTileSize(i32),
    #[error("{agent} speed {speed} must be positive and divide tile size {tile_size}")]
    SpeedDoesNotDivideTile {
        agent: &'static str,
        speed: i32,
        tile_size: i32,
    },
    #[error("collision margin {margin} must be below half of tile size {tile_size}")]
    CollisionMarginOutOfRange { margin: i32, tile_size: i32 },
    #[error("combined speed {combined} lets agents pass through each other, must stay below {limit}")]
    SpeedsSkipCollision { combined: i32, limit: i32 },
    #[error("flash starts at tick {flash_from_tick} but frightened mode lasts {frightened_ticks}")]
    FlashAfterExpiry {
        flash_from_tick: u32,
        frightened_ticks: u32,
    },
    #[error("{0} must be positive")]
    ZeroInterval(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid grid configuration: {0}")]
    Grid(#[from] GridError),
    #[error("invalid game configuration: {0}")]
    Config(#[from] ConfigError),
}
