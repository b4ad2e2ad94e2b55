//! Pikavolley Replay System
//!
//! This crate provides replay recording, recorded-input playback and replay
//! artifact file I/O.
//!
//! # Architecture
//!
//! The replay system consists of:
//! - [`InputRecorder`]: the narrow append-only interface the match controller
//!   records through
//! - [`ReplayRecorder`]: collects input pairs, metadata and practice toggles
//!   and finalizes them into a [`ReplayArtifact`]
//! - [`RecordedInputs`]: an [`InputSource`] that feeds a recorded stream back
//!   one pair per invocation
//!
//! Re-executing an artifact needs the match controller and lives there.

#![deny(unsafe_code)]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pikavolley_sim::{
    FrameInputs, Frame, InputSnapshot, InputSource, RNG_ALGORITHM, STATE_DIGEST_ALGO_ID,
};
use pikavolley_wire::{
    MatchSettings, PracticeModeChange, REPLAY_FORMAT_VERSION, ReplayArtifact, ReplayMetadata,
    pack_inputs,
};

// ============================================================================
// Errors
// ============================================================================

/// Replay file I/O error.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Failed to decode replay: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Replay artifact already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Unsupported replay format version {0}")]
    UnsupportedVersion(u32),
}

// ============================================================================
// Recorder Interface
// ============================================================================

/// Append-only recording interface used by the match controller.
pub trait InputRecorder {
    /// Append one frame's input pair.
    fn append_inputs(&mut self, player1: &InputSnapshot, player2: &InputSnapshot);

    /// Record the one-time match metadata.
    fn record_metadata(&mut self, room_id: &str, nickname1: &str, nickname2: &str);

    /// Drop everything recorded so far.
    fn clear(&mut self);

    /// Record a practice mode toggle taking effect before invocation `frame`.
    fn record_practice_mode(&mut self, frame: Frame, enabled: bool);
}

// ============================================================================
// Replay Recorder
// ============================================================================

/// End-of-recording values stored alongside the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOutcome {
    pub scores: [u32; 2],
    pub final_digest: u64,
    pub game_ended: bool,
}

/// Records match data for replay artifact generation.
#[derive(Debug, Clone, Default)]
pub struct ReplayRecorder {
    metadata: Option<ReplayMetadata>,
    inputs: Vec<FrameInputs>,
    practice_mode_changes: Vec<PracticeModeChange>,
}

impl ReplayRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self) -> Option<&ReplayMetadata> {
        self.metadata.as_ref()
    }

    /// Recorded input pairs, one per invocation.
    pub fn inputs(&self) -> &[FrameInputs] {
        &self.inputs
    }

    pub fn practice_mode_changes(&self) -> &[PracticeModeChange] {
        &self.practice_mode_changes
    }

    /// Number of recorded invocations.
    pub fn frame_count(&self) -> Frame {
        self.inputs.len() as Frame
    }

    /// Finalize the replay artifact.
    pub fn finalize(&self, settings: MatchSettings, outcome: MatchOutcome) -> ReplayArtifact {
        ReplayArtifact {
            replay_format_version: REPLAY_FORMAT_VERSION,
            metadata: self.metadata.clone(),
            rng_algorithm: RNG_ALGORITHM.to_string(),
            settings: Some(settings),
            inputs: pack_inputs(&self.inputs),
            practice_mode_changes: self.practice_mode_changes.clone(),
            final_scores: outcome.scores.to_vec(),
            final_digest: outcome.final_digest,
            frame_count: self.frame_count(),
            state_digest_algo_id: STATE_DIGEST_ALGO_ID.to_string(),
            game_ended: outcome.game_ended,
        }
    }
}

impl InputRecorder for ReplayRecorder {
    fn append_inputs(&mut self, player1: &InputSnapshot, player2: &InputSnapshot) {
        self.inputs.push([*player1, *player2]);
    }

    fn record_metadata(&mut self, room_id: &str, nickname1: &str, nickname2: &str) {
        if self.metadata.is_some() {
            tracing::warn!(room_id, "replay metadata recorded twice, keeping the latest");
        }
        self.metadata = Some(ReplayMetadata {
            room_id: room_id.to_string(),
            nickname1: nickname1.to_string(),
            nickname2: nickname2.to_string(),
        });
    }

    fn clear(&mut self) {
        self.metadata = None;
        self.inputs.clear();
        self.practice_mode_changes.clear();
    }

    fn record_practice_mode(&mut self, frame: Frame, enabled: bool) {
        self.practice_mode_changes
            .push(PracticeModeChange { frame, enabled });
    }
}

// ============================================================================
// Recorded Input Playback
// ============================================================================

/// Input source replaying a recorded stream, one pair per capture.
///
/// Captures past the end of the stream yield idle inputs.
#[derive(Debug, Clone)]
pub struct RecordedInputs {
    frames: Vec<FrameInputs>,
    cursor: usize,
}

impl RecordedInputs {
    pub fn new(frames: Vec<FrameInputs>) -> Self {
        Self { frames, cursor: 0 }
    }
}

impl InputSource for RecordedInputs {
    fn capture(&mut self) -> FrameInputs {
        let inputs = self
            .frames
            .get(self.cursor)
            .copied()
            .unwrap_or([InputSnapshot::IDLE; 2]);
        self.cursor += 1;
        inputs
    }
}

// ============================================================================
// Replay I/O
// ============================================================================

/// Write a replay artifact to a file. Refuses to overwrite an existing file.
pub fn write_replay(artifact: &ReplayArtifact, path: &Path) -> Result<(), ReplayError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(ReplayError::AlreadyExists(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(&artifact.to_bytes())?;

    tracing::debug!(
        path = %path.display(),
        frames = artifact.frame_count,
        "replay written"
    );
    Ok(())
}

/// Read a replay artifact from a file.
pub fn read_replay(path: &Path) -> Result<ReplayArtifact, ReplayError> {
    let data = fs::read(path)?;
    let artifact = ReplayArtifact::from_bytes(&data)?;
    if artifact.replay_format_version != REPLAY_FORMAT_VERSION {
        return Err(ReplayError::UnsupportedVersion(
            artifact.replay_format_version,
        ));
    }
    Ok(artifact)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MatchSettings {
        MatchSettings {
            winning_score: 15,
            normal_fps: 30,
            slow_motion_fps: 5,
            slow_motion_frames: 6,
            stereo_sound: true,
            frame_totals: None,
        }
    }

    fn recorded(frames: usize) -> ReplayRecorder {
        let mut recorder = ReplayRecorder::new();
        recorder.record_metadata("room-7", "left", "right");
        for i in 0..frames {
            let p1 = InputSnapshot::new((i % 3) as i8 - 1, 0, i % 4 == 0);
            recorder.append_inputs(&p1, &InputSnapshot::IDLE);
        }
        recorder
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("pikavolley-replay-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_finalize_has_required_fields() {
        let recorder = recorded(10);
        let artifact = recorder.finalize(
            settings(),
            MatchOutcome {
                scores: [15, 4],
                final_digest: 0xabcd,
                game_ended: true,
            },
        );

        assert_eq!(artifact.replay_format_version, 1);
        assert_eq!(artifact.metadata.as_ref().unwrap().room_id, "room-7");
        assert_eq!(artifact.rng_algorithm, RNG_ALGORITHM);
        assert_eq!(artifact.state_digest_algo_id, STATE_DIGEST_ALGO_ID);
        assert_eq!(artifact.inputs.len(), 10);
        assert_eq!(artifact.frame_count, 10);
        assert_eq!(artifact.final_scores, vec![15, 4]);
        assert!(artifact.game_ended);
        assert_eq!(artifact.frame_inputs().unwrap(), recorder.inputs());
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut recorder = recorded(5);
        recorder.record_practice_mode(3, true);
        recorder.clear();

        assert!(recorder.metadata().is_none());
        assert_eq!(recorder.frame_count(), 0);
        assert!(recorder.practice_mode_changes().is_empty());
    }

    #[test]
    fn test_practice_toggles_kept_in_order() {
        let mut recorder = recorded(0);
        recorder.record_practice_mode(4, true);
        recorder.record_practice_mode(9, false);
        let artifact = recorder.finalize(settings(), MatchOutcome::default());
        assert_eq!(
            artifact.practice_mode_changes,
            vec![
                PracticeModeChange {
                    frame: 4,
                    enabled: true
                },
                PracticeModeChange {
                    frame: 9,
                    enabled: false
                },
            ]
        );
    }

    #[test]
    fn test_recorded_inputs_playback() {
        let recorder = recorded(3);
        let mut source = RecordedInputs::new(recorder.inputs().to_vec());

        for expected in recorder.inputs() {
            assert_eq!(&source.capture(), expected);
        }
        assert_eq!(source.capture(), [InputSnapshot::IDLE; 2]);
    }

    #[test]
    fn test_write_then_read_replay() {
        let path = temp_path("write_then_read.pvr");
        let _ = fs::remove_file(&path);

        let artifact = recorded(20).finalize(settings(), MatchOutcome::default());
        write_replay(&artifact, &path).unwrap();
        let loaded = read_replay(&path).unwrap();
        assert_eq!(artifact, loaded);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_refuses_to_overwrite() {
        let path = temp_path("no_overwrite.pvr");
        let _ = fs::remove_file(&path);

        let artifact = recorded(1).finalize(settings(), MatchOutcome::default());
        write_replay(&artifact, &path).unwrap();
        let second = write_replay(&artifact, &path);
        assert!(matches!(second, Err(ReplayError::AlreadyExists(_))));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_rejects_unknown_version() {
        let path = temp_path("future_version.pvr");
        let _ = fs::remove_file(&path);

        let mut artifact = recorded(1).finalize(settings(), MatchOutcome::default());
        artifact.replay_format_version = 99;
        write_replay(&artifact, &path).unwrap();
        assert!(matches!(
            read_replay(&path),
            Err(ReplayError::UnsupportedVersion(99))
        ));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_rejects_garbage() {
        let path = temp_path("garbage.pvr");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, [0xff, 0xff, 0xff]).unwrap();
        assert!(matches!(read_replay(&path), Err(ReplayError::Decode(_))));
        fs::remove_file(&path).unwrap();
    }
}
