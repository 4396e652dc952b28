use super::*;

impl GameEngine {
    /// Collidable ghosts overlapping the player, measured before anything
    /// moves this tick.
    pub(super) fn detect_collisions(&self) -> Vec<usize> {
        let tile_size = self.config.tile_size;
        let margin = self.config.collision_margin;
        let Some(player) = self.player.as_ref() else {
            return Vec::new();
        };
        let player_box = player.agent.bounding_box(tile_size, margin);
        self.ghosts
            .iter()
            .enumerate()
            .filter(|(_, ghost)| ghost.mode().is_collidable())
            .filter(|(_, ghost)| ghost.agent.bounding_box(tile_size, margin).overlaps(&player_box))
            .map(|(idx, _)| idx)
            .collect()
    }

    pub(super) fn apply_collisions(&mut self, hits: &[usize]) {
        for &ghost_idx in hits {
            match self.ghosts[ghost_idx].mode() {
                GhostMode::Frightened => {
                    self.transition_ghost(ghost_idx, GhostMode::Eaten);
                    self.transition_ghost(ghost_idx, GhostMode::Returning);
                    let points = self.config.ghost_points;
                    self.session.score += points;
                    self.events.push(RuntimeEvent::GhostEaten {
                        ghost_id: self.ghosts[ghost_idx].id().to_string(),
                        points,
                        score: self.session.score,
                    });
                }
                GhostMode::Free => {
                    self.session.catches += 1;
                    self.session.phase = SessionPhase::Lost;
                    if let Some(player) = self.player.as_mut() {
                        player.agent.halt();
                    }
                    self.events.push(RuntimeEvent::PlayerCaught {
                        ghost_id: self.ghosts[ghost_idx].id().to_string(),
                        score: self.session.score,
                        catches: self.session.catches,
                    });
                    return;
                }
                _ => {}
            }
        }
    }

    /// Every Free ghost turns Frightened and the countdown restarts.
    pub(super) fn frighten_free_ghosts(&mut self) {
        for idx in 0..self.ghosts.len() {
            if self.ghosts[idx].mode() == GhostMode::Free {
                self.transition_ghost(idx, GhostMode::Frightened);
            }
        }
        self.session.frightened_active = true;
        self.session.frightened_elapsed = 0;
    }

    pub(super) fn update_frightened(&mut self) {
        if !self.session.frightened_active {
            return;
        }
        let any_frightened = self
            .ghosts
            .iter()
            .any(|ghost| ghost.mode() == GhostMode::Frightened);
        if !any_frightened {
            self.session.frightened_active = false;
            self.session.frightened_elapsed = 0;
            return;
        }
        self.session.frightened_elapsed += 1;
        if self.session.frightened_elapsed < self.config.frightened_ticks {
            return;
        }
        for idx in 0..self.ghosts.len() {
            if self.ghosts[idx].mode() == GhostMode::Frightened {
                self.transition_ghost(idx, GhostMode::Free);
            }
        }
        self.session.frightened_active = false;
        self.session.frightened_elapsed = 0;
    }

    pub(super) fn update_release_schedule(&mut self) {
        let first = self.config.first_release_ticks;
        let ticks = self.session.active_ticks;
        if ticks < first || (ticks - first) % self.config.release_interval_ticks != 0 {
            return;
        }
        self.release_next_ghost();
    }

    pub(super) fn consume_dots(&mut self) {
        let tile_size = self.config.tile_size;
        let Some(player) = self.player.as_mut() else {
            return;
        };
        let cell = player.agent.center_cell(tile_size);
        let Some(kind) = self.grid.consume_dot_at(cell.row, cell.col) else {
            return;
        };
        player.dots_eaten += 1;
        let dots_eaten = player.dots_eaten;
        self.session.score += match kind {
            DotKind::Small => self.config.dot_points,
            DotKind::Power => self.config.power_dot_points,
        };
        let dots_remaining = self.grid.dots_remaining();
        self.events.push(RuntimeEvent::DotEaten {
            kind,
            row: cell.row,
            col: cell.col,
            score: self.session.score,
            dots_remaining,
        });
        if kind == DotKind::Power {
            self.frighten_free_ghosts();
        }
        if dots_remaining == 0 {
            self.session.phase = SessionPhase::Won;
            if let Some(player) = self.player.as_mut() {
                player.agent.halt();
            }
            self.events.push(RuntimeEvent::LevelCleared {
                score: self.session.score,
                dots_eaten,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;
    use crate::world::tests::SMALL_LAYOUT;

    fn small_engine() -> GameEngine {
        GameEngine::from_layout(&SMALL_LAYOUT, GameConfig::default(), 17)
            .expect("small layout is valid")
    }

    #[test]
    fn collision_uses_margin_shrunk_boxes() {
        let mut engine = small_engine();
        let player_pos = engine.player().expect("player spawned").agent.position;
        // 8-wide tiles with a 2 margin leave 4-wide boxes: 4 apart only touches.
        engine.ghosts[0].agent.position = Position {
            x: player_pos.x + 4,
            y: player_pos.y,
        };
        assert!(engine.detect_collisions().is_empty());
        engine.ghosts[0].agent.position.x -= 1;
        assert_eq!(engine.detect_collisions(), vec![0]);
    }

    #[test]
    fn ghosts_in_the_house_never_collide() {
        let mut engine = small_engine();
        let player_pos = engine.player().expect("player spawned").agent.position;
        for ghost in engine.ghosts.iter_mut().skip(1) {
            ghost.agent.position = player_pos;
        }
        assert!(engine.detect_collisions().is_empty());
    }

    #[test]
    fn collision_outcome_uses_positions_from_before_movement() {
        let mut engine = small_engine();
        let player_pos = engine.player().expect("player spawned").agent.position;
        engine.ghosts[0].agent.position = Position {
            x: player_pos.x + 4,
            y: player_pos.y,
        };
        engine.set_input(Direction::Right);
        engine.start();
        engine.step();
        // The player stepped into the ghost's box, but only after detection.
        assert_eq!(engine.phase(), SessionPhase::Active);
        engine.step();
        assert_eq!(engine.phase(), SessionPhase::Lost);
    }

    #[test]
    fn head_on_approach_at_fastest_valid_speeds_is_caught() {
        let config = GameConfig {
            player_speed: 4,
            ghost_speed: 2,
            ghost_start_delay_ticks: 0,
            ..GameConfig::default()
        };
        let mut engine =
            GameEngine::from_layout(&SMALL_LAYOUT, config, 17).expect("config is valid");
        let mut red = Agent::at_cell(Cell::new(1, 6), Direction::Left, 2, 8);
        red.position.x += 4;
        red.launch();
        engine.ghosts[0].agent = red;
        engine.set_input(Direction::Right);
        engine.start();

        for _ in 0..3 {
            engine.step();
        }
        assert_eq!(engine.phase(), SessionPhase::Lost);
        assert!(engine
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::PlayerCaught { .. })));
    }

    #[test]
    fn release_waits_for_first_release_tick_then_repeats() {
        let mut engine = small_engine();
        let first = engine.config.first_release_ticks;
        let interval = engine.config.release_interval_ticks;

        engine.session.active_ticks = first - 1;
        engine.update_release_schedule();
        assert_eq!(engine.ghosts[1].mode(), GhostMode::InHouse);

        engine.session.active_ticks = first;
        engine.update_release_schedule();
        assert_eq!(engine.ghosts[1].mode(), GhostMode::Exiting);

        engine.session.active_ticks = first + interval / 2;
        engine.update_release_schedule();
        assert_eq!(engine.session.pending_release, None);

        engine.session.active_ticks = first + interval;
        engine.update_release_schedule();
        assert_eq!(engine.session.pending_release, Some(2));
    }

    #[test]
    fn small_dot_scores_once() {
        let mut engine = small_engine();
        engine.player.as_mut().expect("player").agent.position = Position::of_cell(Cell::new(1, 1), 8);
        engine.consume_dots();
        engine.consume_dots();
        assert_eq!(engine.score(), engine.config.dot_points);
        assert_eq!(engine.events.len(), 1);
        assert_eq!(engine.player().expect("player").dots_eaten, 1);
    }
}
