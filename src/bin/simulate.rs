use clap::Parser;
use mspacman_engine::engine::GameEngine;
use mspacman_engine::error::EngineError;
use mspacman_engine::types::{DotKind, GameConfig, RuntimeEvent, SessionPhase, Snapshot};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

const DEFAULT_MAX_TICKS: u64 = 20 * 60 * 5;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    scenarios: Option<u32>,
    #[arg(long)]
    max_ticks: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    /// JSON file with `GameConfig` overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum FinishReason {
    Won,
    Lost,
    TickLimit,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    reason: FinishReason,
    ticks: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    score: u32,
    #[serde(rename = "dotsEaten")]
    dots_eaten: u32,
    #[serde(rename = "dotsRemaining")]
    dots_remaining: u32,
    #[serde(rename = "powerDots")]
    power_dots: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "modeTransitions")]
    mode_transitions: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

#[derive(Debug, Error)]
enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Values carried from one snapshot to the next for monotonicity checks.
#[derive(Clone, Copy, Debug)]
struct Watermarks {
    score: u32,
    dots_remaining: u32,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            emit_log(
                "error",
                "config_load_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": cli.config.as_ref().map(|path| path.to_string_lossy()),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    };

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "maxTicks": scenario.max_ticks,
                "tickMs": config.tick_ms,
            }),
        );
        let scenario_run = match run_scenario(&scenario, &config) {
            Ok(run) => run,
            Err(error) => {
                emit_log(
                    "error",
                    "engine_init_failed",
                    &match_id,
                    Some(&scenario.name),
                    Some(scenario.seed),
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        *reason_counts
            .entry(finish_reason_key(scenario_run.result.reason))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "reason": scenario_run.result.reason,
                "score": scenario_run.result.score,
                "dotsRemaining": scenario_run.result.dots_remaining,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        reason_counts,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<GameConfig, ConfigLoadError> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn run_scenario(
    scenario: &Scenario,
    config: &GameConfig,
) -> Result<ScenarioRunResult, EngineError> {
    let mut engine = GameEngine::classic(config.clone(), scenario.seed)?;
    let mut bot_rng = StdRng::seed_from_u64(u64::from(scenario.seed));
    engine.start();

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut power_dots = 0;
    let mut ghosts_eaten = 0;
    let mut mode_transitions = 0usize;
    let mut last_tick = 0u64;
    let mut marks = Watermarks {
        score: engine.score(),
        dots_remaining: engine.grid().dots_remaining(),
    };

    while !engine.is_ended() {
        if let Some(direction) = engine.autopilot_direction(&mut bot_rng) {
            engine.set_input(direction);
        }
        engine.advance(config.tick_ms);
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;

        let mut found = collect_snapshot_anomalies(&snapshot, marks);
        found.extend(collect_engine_anomalies(&engine));
        for message in found {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        marks = Watermarks {
            score: snapshot.score,
            dots_remaining: snapshot.dots_remaining,
        };

        mode_transitions += snapshot.transitions.len();
        for event in &snapshot.events {
            match event {
                RuntimeEvent::DotEaten { kind, .. } => {
                    if *kind == DotKind::Power {
                        power_dots += 1;
                    }
                }
                RuntimeEvent::GhostEaten { .. } => ghosts_eaten += 1,
                _ => {}
            }
        }

        if snapshot.tick >= scenario.max_ticks {
            break;
        }
    }

    let reason = match engine.phase() {
        SessionPhase::Won => FinishReason::Won,
        SessionPhase::Lost => FinishReason::Lost,
        _ => FinishReason::TickLimit,
    };
    let dots_eaten = engine.player().map(|player| player.dots_eaten).unwrap_or(0);

    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            reason,
            ticks: last_tick,
            duration_ms: last_tick * config.tick_ms,
            score: engine.score(),
            dots_eaten,
            dots_remaining: engine.grid().dots_remaining(),
            power_dots,
            ghosts_eaten,
            mode_transitions,
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    })
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, previous: Watermarks) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.score < previous.score {
        anomalies.push(format!(
            "score went backwards: {} -> {}",
            previous.score, snapshot.score
        ));
    }
    if snapshot.dots_remaining > previous.dots_remaining {
        anomalies.push(format!(
            "dots reappeared: {} -> {}",
            previous.dots_remaining, snapshot.dots_remaining
        ));
    }
    for transition in &snapshot.transitions {
        if !transition.from.can_transition_to(transition.to) {
            anomalies.push(format!(
                "illegal mode transition for {}: {:?} -> {:?}",
                transition.ghost_id, transition.from, transition.to
            ));
        }
    }
    if snapshot.flashing && !snapshot.frightened {
        anomalies.push("flashing without frightened mode".to_string());
    }
    anomalies
}

fn collect_engine_anomalies(engine: &GameEngine) -> Vec<String> {
    let mut anomalies = Vec::new();
    let tile_size = engine.config.tile_size;
    let grid = engine.grid();

    if let Some(player) = engine.player() {
        if !player.agent.motion_is_consistent() {
            anomalies.push("player speed does not match direction".to_string());
        }
        if !grid.contains_position(player.agent.position, tile_size) {
            anomalies.push(format!(
                "player out of bounds: ({}, {})",
                player.agent.position.x, player.agent.position.y
            ));
        }
        let cell = player.agent.cell(tile_size);
        if player.agent.is_aligned(tile_size) && grid.is_blocked(cell.row, cell.col, false) {
            anomalies.push(format!(
                "player inside a blocked cell: ({}, {})",
                cell.row, cell.col
            ));
        }
    }

    for ghost in engine.ghosts() {
        if !ghost.agent.motion_is_consistent() {
            anomalies.push(format!("{} speed does not match direction", ghost.id()));
        }
        if !grid.contains_position(ghost.agent.position, tile_size) {
            anomalies.push(format!(
                "{} out of bounds: ({}, {})",
                ghost.id(),
                ghost.agent.position.x,
                ghost.agent.position.y
            ));
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }));
    let max_ticks = cli.max_ticks.unwrap_or(DEFAULT_MAX_TICKS).max(1);
    let count = if cli.single {
        1
    } else {
        cli.scenarios.unwrap_or(3).clamp(1, 100)
    };

    (0..count)
        .map(|idx| Scenario {
            name: format!("classic-autopilot-{:02}", idx + 1),
            seed: seed.wrapping_add(idx),
            max_ticks,
        })
        .collect()
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let total_score: u64 = scenarios.iter().map(|s| u64::from(s.score)).sum();
    let average_score = if scenario_count == 0 {
        0
    } else {
        (total_score / scenario_count as u64) as u32
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_score,
        reason_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    if let Ok(line) = serde_json::to_string(&log_line) {
        eprintln!("{line}");
    }
}

fn finish_reason_key(reason: FinishReason) -> String {
    match reason {
        FinishReason::Won => "won",
        FinishReason::Lost => "lost",
        FinishReason::TickLimit => "tick_limit",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mspacman_engine::types::{GhostMode, ModeTransition};

    fn make_scenario_result(reason: FinishReason, score: u32) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            reason,
            ticks: 100,
            duration_ms: 5_000,
            score,
            dots_eaten: 0,
            dots_remaining: 0,
            power_dots: 0,
            ghosts_eaten: 0,
            mode_transitions: 0,
            anomalies: Vec::new(),
        }
    }

    fn empty_snapshot(score: u32, dots_remaining: u32) -> Snapshot {
        let mut engine = GameEngine::classic(GameConfig::default(), 1).expect("classic layout");
        let mut snapshot = engine.build_snapshot(true);
        snapshot.score = score;
        snapshot.dots_remaining = dots_remaining;
        snapshot
    }

    #[test]
    fn default_match_id_contains_seed_and_timestamp() {
        assert_eq!(default_match_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_score() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![
                make_scenario_result(FinishReason::Lost, 1_000),
                make_scenario_result(FinishReason::Won, 3_000),
            ],
            BTreeMap::from([("lost".to_string(), 1usize), ("won".to_string(), 1usize)]),
            1,
        );
        assert_eq!(summary.average_score, 2_000);
        assert_eq!(summary.scenario_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let target = std::env::temp_dir()
            .join(format!("mspacman-missing-{now}"))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            1,
            2,
            vec![make_scenario_result(FinishReason::TickLimit, 0)],
            BTreeMap::from([("tick_limit".to_string(), 1usize)]),
            0,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            10,
            "same anomaly".to_string(),
        );
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            11,
            "same anomaly".to_string(),
        );

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tick, 10);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn snapshot_checks_flag_regressions_and_illegal_edges() {
        let marks = Watermarks {
            score: 100,
            dots_remaining: 50,
        };
        assert!(collect_snapshot_anomalies(&empty_snapshot(100, 50), marks).is_empty());

        let mut snapshot = empty_snapshot(90, 51);
        snapshot.transitions.push(ModeTransition {
            tick: 3,
            ghost_id: "ghost_pink".to_string(),
            from: GhostMode::InHouse,
            to: GhostMode::Free,
        });
        let found = collect_snapshot_anomalies(&snapshot, marks);
        assert_eq!(found.len(), 3);
        assert!(found[2].contains("ghost_pink"));
    }

    #[test]
    fn resolve_scenarios_spreads_seeds() {
        let cli = Cli::parse_from(["simulate", "--seed", "7", "--scenarios", "2", "--max-ticks", "10"]);
        let scenarios = resolve_scenarios(&cli);
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].seed, 7);
        assert_eq!(scenarios[1].seed, 8);
        assert_eq!(scenarios[1].max_ticks, 10);

        let single = Cli::parse_from(["simulate", "--single", "--scenarios", "5"]);
        assert_eq!(resolve_scenarios(&single).len(), 1);
    }

    #[test]
    fn autopilot_scenario_runs_clean() {
        let scenario = Scenario {
            name: "smoke".to_string(),
            seed: 11,
            max_ticks: 600,
        };
        let run = run_scenario(&scenario, &GameConfig::default()).expect("classic layout");
        assert!(run.result.anomalies.is_empty(), "{:?}", run.result.anomalies);
        assert!(run.result.score > 0);
        assert!(run.finished_tick <= 600);
    }

    #[test]
    fn config_load_errors_are_typed() {
        let missing = std::env::temp_dir().join("mspacman-no-such-config.json");
        assert!(matches!(
            load_config(Some(&missing)),
            Err(ConfigLoadError::Io(_))
        ));

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let broken = std::env::temp_dir().join(format!("mspacman-broken-config-{now}.json"));
        std::fs::write(&broken, "{ tickMs: 10").expect("temp file is writable");
        let result = load_config(Some(&broken));
        let _ = std::fs::remove_file(&broken);
        assert!(matches!(result, Err(ConfigLoadError::Json(_))));

        assert_eq!(
            load_config(None).expect("defaults load"),
            GameConfig::default()
        );
    }
}
