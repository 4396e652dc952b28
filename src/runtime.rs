use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::engine::GameEngine;
use crate::types::{Direction, Snapshot};

const COMMAND_BUFFER: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    Input(Direction),
    Start,
    TogglePause,
    Restart,
    Shutdown,
}

/// Channels into a running session task.
pub struct SessionHandle {
    pub commands: mpsc::Sender<SessionCommand>,
    pub frames: mpsc::Receiver<Snapshot>,
    pub task: JoinHandle<GameEngine>,
}

/// Drives `engine` on its own fixed-tick task. One frame is published per
/// tick; when the renderer falls `frame_buffer` frames behind, new frames
/// are skipped and their events carry over to the next delivered frame.
pub fn spawn_session(engine: GameEngine, frame_buffer: usize) -> SessionHandle {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (frame_tx, frame_rx) = mpsc::channel(frame_buffer.max(1));
    let task = tokio::spawn(run_session(engine, command_rx, frame_tx));
    SessionHandle {
        commands: command_tx,
        frames: frame_rx,
        task,
    }
}

async fn run_session(
    mut engine: GameEngine,
    mut commands: mpsc::Receiver<SessionCommand>,
    frames: mpsc::Sender<Snapshot>,
) -> GameEngine {
    let mut interval = tokio::time::interval(Duration::from_millis(engine.config.tick_ms));
    loop {
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => apply_command(&mut engine, command),
                }
            }
            _ = interval.tick() => {
                engine.step();
                match frames.try_reserve() {
                    Ok(permit) => permit.send(engine.build_snapshot(true)),
                    Err(TrySendError::Full(())) => {}
                    Err(TrySendError::Closed(())) => break,
                }
            }
        }
    }
    engine
}

fn apply_command(engine: &mut GameEngine, command: SessionCommand) {
    match command {
        SessionCommand::Input(direction) => {
            engine.set_input(direction);
        }
        SessionCommand::Start => {
            engine.start();
        }
        SessionCommand::TogglePause => {
            engine.toggle_pause();
        }
        SessionCommand::Restart => engine.restart(),
        SessionCommand::Shutdown => {}
    }
}
