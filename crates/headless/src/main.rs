//! Headless Pikavolley driver.
//!
//! ```text
//! pikavolley-headless simulate [--config=PATH] [--room=ID] [--frames=N] [--out=PATH]
//! pikavolley-headless verify PATH
//! ```
//!
//! `simulate` lets the menu idle into the computer-vs-computer demo, plays it
//! until the game ends (or the frame cap is hit) and writes the replay.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pikavolley_controller::{
    MatchConfig, MatchController, PresentationEvent, ScriptedInput, verify_replay,
};
use pikavolley_replay::{read_replay, write_replay};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "pikavolley.toml";
const DEFAULT_MAX_FRAMES: u64 = 200_000;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("simulate") => simulate(&args[1..]),
        Some("verify") => match args.get(1) {
            Some(path) => verify(Path::new(path)),
            None => usage(),
        },
        _ => usage(),
    }
}

fn usage() -> ExitCode {
    tracing::error!(
        "usage: pikavolley-headless simulate [--config=PATH] [--room=ID] [--frames=N] [--out=PATH] | verify PATH"
    );
    ExitCode::FAILURE
}

/// Value of a `--name=value` argument.
fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .find_map(|arg| arg.strip_prefix(name)?.strip_prefix('='))
}

fn simulate(args: &[String]) -> ExitCode {
    let config_path = flag(args, "--config").unwrap_or(DEFAULT_CONFIG_PATH);
    let config = MatchConfig::load_or_default(Path::new(config_path));

    let max_frames = match flag(args, "--frames").map(str::parse::<u64>) {
        None => DEFAULT_MAX_FRAMES,
        Some(Ok(frames)) => frames,
        Some(Err(e)) => {
            tracing::error!("invalid --frames: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut controller = MatchController::new(config, ScriptedInput::new());
    if let Some(room_id) = flag(args, "--room") {
        controller.restart_with_room_id(room_id);
    }
    tracing::info!(room_id = controller.room_id(), max_frames, "simulating");

    for _ in 0..max_frames {
        controller.advance_one_frame();
        for event in controller.drain_events() {
            if let PresentationEvent::ScoresChanged(scores) = event {
                tracing::debug!(?scores, "score");
            }
        }
        if controller.final_outcome().is_some() {
            break;
        }
    }

    let artifact = controller.replay_artifact();
    let outcome = controller.outcome();
    let out = flag(args, "--out").map_or_else(
        || PathBuf::from("replays").join(format!("{}.pvr", controller.room_id())),
        PathBuf::from,
    );
    if let Err(e) = write_replay(&artifact, &out) {
        tracing::error!("failed to write replay: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        path = %out.display(),
        frames = artifact.frame_count,
        scores = ?outcome.scores,
        game_ended = outcome.game_ended,
        "replay written"
    );
    ExitCode::SUCCESS
}

fn verify(path: &Path) -> ExitCode {
    let artifact = match read_replay(path) {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::error!(path = %path.display(), "{e}");
            return ExitCode::FAILURE;
        }
    };

    match verify_replay(&artifact) {
        Ok(()) => {
            tracing::info!(
                path = %path.display(),
                frames = artifact.frame_count,
                scores = ?artifact.final_scores,
                "replay verified"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(path = %path.display(), "replay verification failed: {e}");
            ExitCode::FAILURE
        }
    }
}
