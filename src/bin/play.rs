use clap::Parser;
use mspacman_engine::constants::TICK_MS;
use mspacman_engine::engine::GameEngine;
use mspacman_engine::runtime::{spawn_session, SessionCommand};
use mspacman_engine::types::{Direction, GameConfig};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncBufReadExt, BufReader};

const FRAME_BUFFER: usize = 8;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = TICK_MS)]
    tick_ms: u64,
    #[arg(long)]
    seed: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineCommand {
    Session(SessionCommand),
    Quit,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(|| now_ms() as u32);
    let config = GameConfig {
        tick_ms: cli.tick_ms,
        ..GameConfig::default()
    };

    let engine = match GameEngine::classic(config, seed) {
        Ok(engine) => engine,
        Err(error) => {
            emit_log(
                "error",
                "session_init_failed",
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };
    emit_log(
        "info",
        "session_started",
        None,
        json!({
            "seed": seed,
            "tickMs": cli.tick_ms,
            "dots": engine.grid().dots_remaining(),
        }),
    );

    let mut handle = spawn_session(engine, FRAME_BUFFER);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let command = match line {
                    Ok(Some(raw)) => match parse_line(&raw) {
                        Some(command) => command,
                        None => {
                            if !raw.trim().is_empty() {
                                emit_log("warn", "unknown_input", None, json!({ "input": raw }));
                            }
                            continue;
                        }
                    },
                    Ok(None) | Err(_) => {
                        stdin_open = false;
                        LineCommand::Quit
                    }
                };
                let command = match command {
                    LineCommand::Session(command) => command,
                    LineCommand::Quit => SessionCommand::Shutdown,
                };
                if handle.commands.send(command).await.is_err() {
                    break;
                }
            }
            frame = handle.frames.recv() => {
                let Some(frame) = frame else {
                    break;
                };
                for event in &frame.events {
                    emit_log("info", "session_event", Some(frame.tick), json!(event));
                }
                match serde_json::to_string(&frame) {
                    Ok(line) => println!("{line}"),
                    Err(error) => emit_log(
                        "error",
                        "frame_serialize_failed",
                        Some(frame.tick),
                        json!({ "error": error.to_string() }),
                    ),
                }
            }
        }
    }

    drop(handle.commands);
    match handle.task.await {
        Ok(engine) => emit_log(
            "info",
            "session_stopped",
            Some(engine.tick()),
            json!({
                "phase": engine.phase(),
                "score": engine.score(),
                "dotsRemaining": engine.grid().dots_remaining(),
            }),
        ),
        Err(error) => emit_log(
            "error",
            "session_stopped",
            None,
            json!({ "error": error.to_string() }),
        ),
    }
}

/// Accepts direction words, WASD, arrow escape sequences, key codes and
/// the session verbs.
fn parse_line(raw: &str) -> Option<LineCommand> {
    let trimmed = raw.trim();
    let direction = match trimmed {
        "\u{1b}[A" => Some(Direction::Up),
        "\u{1b}[B" => Some(Direction::Down),
        "\u{1b}[C" => Some(Direction::Right),
        "\u{1b}[D" => Some(Direction::Left),
        _ => Direction::parse_move(trimmed).or_else(|| {
            trimmed
                .parse::<u32>()
                .ok()
                .and_then(Direction::from_key_code)
        }),
    };
    if let Some(direction) = direction {
        return Some(LineCommand::Session(SessionCommand::Input(direction)));
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "start" | "enter" => Some(LineCommand::Session(SessionCommand::Start)),
        "pause" | "p" => Some(LineCommand::Session(SessionCommand::TogglePause)),
        "restart" | "r" => Some(LineCommand::Session(SessionCommand::Restart)),
        "quit" | "q" | "exit" => Some(LineCommand::Quit),
        _ => None,
    }
}

fn emit_log(level: &str, event: &str, tick: Option<u64>, details: Value) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        tick,
        details,
    };
    if let Ok(line) = serde_json::to_string(&log_line) {
        eprintln!("{line}");
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
