use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

use crate::agent::{Agent, GhostAgent, PlayerAgent};
use crate::constants::GHOST_COUNT;
use crate::error::EngineError;
use crate::rng::{RandomSource, Rng};
use crate::types::{
    Cell, Direction, DotKind, GameConfig, GhostColor, GhostMode, GhostView, HomeSlot, ModeTransition,
    Orientation, PlayerView, RuntimeEvent, SessionPhase, Snapshot,
};
use crate::world::Grid;

mod autopilot;
mod director;
mod ghost_house;
mod movement;
mod targeting;
mod utils;

pub use self::movement::{resolve, turn_orientation, ResolveOutcome};
pub use self::targeting::choose_direction;

use self::utils::{manhattan, neighbor, random_direction};

/// Session-scoped counters. Rebuilt from scratch on restart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub score: u32,
    pub catches: u32,
    /// Ticks spent `Active` since the agents last spawned.
    pub active_ticks: u32,
    pub frightened_active: bool,
    pub frightened_elapsed: u32,
    /// Side-slot ghost walking to the center slot before it exits.
    pub pending_release: Option<usize>,
    pub respawn_countdown: u32,
}

impl SessionState {
    fn new(phase: SessionPhase) -> Self {
        Self {
            phase,
            score: 0,
            catches: 0,
            active_ticks: 0,
            frightened_active: false,
            frightened_elapsed: 0,
            pending_release: None,
            respawn_countdown: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: GameConfig,

    grid: Grid,
    layout: Grid,
    rng: Rng,
    player: Option<PlayerAgent>,
    ghosts: Vec<GhostAgent>,
    session: SessionState,
    events: Vec<RuntimeEvent>,
    transitions: Vec<ModeTransition>,

    tick_counter: u64,
    tick_remainder_ms: u64,
}

impl GameEngine {
    pub fn new(grid: Grid, config: GameConfig, seed: u32) -> Result<Self, EngineError> {
        config.validate()?;
        let mut engine = Self {
            config,
            layout: grid.clone(),
            grid,
            rng: Rng::new(seed),
            player: None,
            ghosts: Vec::new(),
            session: SessionState::new(SessionPhase::Ready),
            events: Vec::new(),
            transitions: Vec::new(),
            tick_counter: 0,
            tick_remainder_ms: 0,
        };
        engine.spawn_agents();
        Ok(engine)
    }

    pub fn from_layout<S: AsRef<str>>(
        rows: &[S],
        config: GameConfig,
        seed: u32,
    ) -> Result<Self, EngineError> {
        Self::new(Grid::parse(rows)?, config, seed)
    }

    pub fn classic(config: GameConfig, seed: u32) -> Result<Self, EngineError> {
        Self::new(Grid::classic()?, config, seed)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase
    }

    pub fn score(&self) -> u32 {
        self.session.score
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn player(&self) -> Option<&PlayerAgent> {
        self.player.as_ref()
    }

    pub fn ghosts(&self) -> &[GhostAgent] {
        &self.ghosts
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.session.phase, SessionPhase::Won | SessionPhase::Lost)
    }

    pub fn is_flashing(&self) -> bool {
        self.session.frightened_active
            && self.session.frightened_elapsed >= self.config.flash_from_tick
    }

    pub fn start(&mut self) -> bool {
        if self.session.phase != SessionPhase::Ready {
            return false;
        }
        self.session.phase = SessionPhase::Active;
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.session.phase = match self.session.phase {
            SessionPhase::Active => SessionPhase::Paused,
            SessionPhase::Paused => SessionPhase::Active,
            _ => return false,
        };
        true
    }

    /// Drops every agent and counter, restores the dots and respawns after
    /// `restart_delay_ticks`.
    pub fn restart(&mut self) {
        self.grid = self.layout.clone();
        self.player = None;
        self.ghosts.clear();
        self.events.clear();
        self.transitions.clear();
        self.tick_remainder_ms = 0;
        self.session = SessionState::new(SessionPhase::Respawning);
        self.session.respawn_countdown = self.config.restart_delay_ticks;
        if self.session.respawn_countdown == 0 {
            self.finish_respawn();
        }
    }

    /// Buffers the player's next turn. Ignored unless the session is live.
    pub fn set_input(&mut self, direction: Direction) -> bool {
        if !matches!(self.session.phase, SessionPhase::Ready | SessionPhase::Active) {
            return false;
        }
        let Some(player) = self.player.as_mut() else {
            return false;
        };
        player.agent.cached_direction = Some(direction);
        true
    }

    pub fn set_key_code(&mut self, code: u32) -> bool {
        match Direction::from_key_code(code) {
            Some(direction) => self.set_input(direction),
            None => false,
        }
    }

    /// Runs as many whole ticks as `dt_ms` (plus any carried remainder) covers.
    pub fn advance(&mut self, dt_ms: u64) -> u32 {
        self.tick_remainder_ms = self.tick_remainder_ms.saturating_add(dt_ms);
        let mut ticks = 0;
        while self.tick_remainder_ms >= self.config.tick_ms {
            self.tick_remainder_ms -= self.config.tick_ms;
            self.step();
            ticks += 1;
        }
        ticks
    }

    pub fn step(&mut self) {
        match self.session.phase {
            SessionPhase::Active => {}
            SessionPhase::Respawning => {
                self.tick_counter += 1;
                self.session.respawn_countdown = self.session.respawn_countdown.saturating_sub(1);
                if self.session.respawn_countdown == 0 {
                    self.finish_respawn();
                }
                return;
            }
            _ => return,
        }
        self.tick_counter += 1;
        self.session.active_ticks += 1;

        let hits = self.detect_collisions();
        self.move_player();
        if self.session.active_ticks > self.config.ghost_start_delay_ticks {
            self.move_ghosts();
        }
        self.apply_collisions(&hits);
        if self.session.phase != SessionPhase::Active {
            return;
        }
        self.update_frightened();
        self.update_release_schedule();
        self.consume_dots();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let tile_size = self.config.tile_size;
        let flashing = self.is_flashing();
        let mouth_open = (self.session.active_ticks / self.config.mouth_frame_ticks) % 2 == 0;
        Snapshot {
            tick: self.tick_counter,
            phase: self.session.phase,
            score: self.session.score,
            dots_remaining: self.grid.dots_remaining(),
            frightened: self.session.frightened_active,
            flashing,
            power_dots_visible: (self.session.active_ticks / self.config.power_dot_blink_ticks) % 2
                == 0,
            player: self.player.as_ref().map(|player| {
                let cell = player.agent.cell(tile_size);
                PlayerView {
                    x: player.agent.position.x,
                    y: player.agent.position.y,
                    row: cell.row,
                    col: cell.col,
                    dir: player.agent.direction,
                    orientation: player.agent.orientation,
                    speed: player.agent.speed,
                    cached_dir: player.agent.cached_direction,
                    dots_eaten: player.dots_eaten,
                    mouth_open: mouth_open || !player.agent.is_moving(),
                }
            }),
            ghosts: self
                .ghosts
                .iter()
                .map(|ghost| {
                    let cell = ghost.agent.cell(tile_size);
                    GhostView {
                        id: ghost.id().to_string(),
                        color: ghost.color,
                        x: ghost.agent.position.x,
                        y: ghost.agent.position.y,
                        row: cell.row,
                        col: cell.col,
                        dir: ghost.agent.direction,
                        orientation: ghost.agent.orientation,
                        speed: ghost.agent.speed,
                        mode: ghost.mode(),
                        home_slot: ghost.home_slot,
                        flashing: flashing && ghost.mode() == GhostMode::Frightened,
                    }
                })
                .collect(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
            transitions: if include_events {
                std::mem::take(&mut self.transitions)
            } else {
                Vec::new()
            },
        }
    }

    fn finish_respawn(&mut self) {
        self.spawn_agents();
        self.session.phase = SessionPhase::Ready;
    }

    fn spawn_agents(&mut self) {
        let tile_size = self.config.tile_size;
        let ghost_speed = self.config.ghost_speed;
        let house = *self.grid.house();
        self.player = Some(PlayerAgent::spawn(
            self.grid.player_start(),
            self.config.player_speed,
            tile_size,
        ));
        let roster: [(GhostColor, GhostMode, HomeSlot, Cell); GHOST_COUNT] = [
            (
                GhostColor::Red,
                GhostMode::Free,
                HomeSlot::Center,
                house.exit_waypoint(),
            ),
            (
                GhostColor::Pink,
                GhostMode::InHouse,
                HomeSlot::Center,
                house.slot_cell(HomeSlot::Center),
            ),
            (
                GhostColor::Cyan,
                GhostMode::InHouse,
                HomeSlot::Left,
                house.slot_cell(HomeSlot::Left),
            ),
            (
                GhostColor::Orange,
                GhostMode::InHouse,
                HomeSlot::Right,
                house.slot_cell(HomeSlot::Right),
            ),
        ];
        self.ghosts = roster
            .into_iter()
            .map(|(color, mode, slot, cell)| {
                let facing = if mode == GhostMode::Free {
                    Direction::Left
                } else {
                    Direction::Up
                };
                GhostAgent::spawn(
                    color,
                    mode,
                    slot,
                    Agent::at_cell(cell, facing, ghost_speed, tile_size),
                )
            })
            .collect();
    }

    /// Single entry point for mode changes so every edge is logged.
    fn transition_ghost(&mut self, ghost_idx: usize, to: GhostMode) {
        let ghost = &mut self.ghosts[ghost_idx];
        let from = ghost.set_mode(to);
        self.transitions.push(ModeTransition {
            tick: self.tick_counter,
            ghost_id: ghost.id().to_string(),
            from,
            to,
        });
    }
}
