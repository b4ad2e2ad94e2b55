//! Replay re-execution and verification.
//!
//! # Verification Steps
//! 1. Check metadata, settings and algorithm identifiers are present and known
//! 2. Unpack the input stream and check it against the recorded frame count
//! 3. Rebuild a controller from the recorded settings and restart it under the
//!    recorded room identifier
//! 4. Feed each recorded pair as one invocation, applying practice toggles at
//!    their frame index
//! 5. Assert the re-recorded stream equals the recorded one
//! 6. Assert the game-ended flag, final scores and final StateDigest match

use pikavolley_replay::{RecordedInputs, ReplayRecorder};
use pikavolley_sim::{Court, Frame, PhysicsEngine, RNG_ALGORITHM, STATE_DIGEST_ALGO_ID};
use pikavolley_wire::ReplayArtifact;

use crate::config::{ConfigError, MatchConfig};
use crate::room::FixedRoomId;
use crate::MatchController;

/// Replay verification error.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Missing match metadata in replay artifact")]
    MissingMetadata,

    #[error("Missing match settings in replay artifact")]
    MissingSettings,

    #[error("Unsupported {what}: {actual} (expected {expected})")]
    AlgorithmMismatch {
        what: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("Invalid recorded settings: {0}")]
    InvalidSettings(#[from] ConfigError),

    #[error("Invalid input stream: {reason}")]
    InvalidInput { reason: String },

    #[error("Frame count mismatch: expected {expected}, got {actual}")]
    FrameCountMismatch { expected: Frame, actual: Frame },

    #[error("Re-recorded input stream diverges at frame {frame}")]
    InputStreamDiverged { frame: Frame },

    #[error("Re-recorded practice mode toggles diverge")]
    PracticeTogglesDiverged,

    #[error("Game ended mismatch: expected {expected}, got {actual}")]
    GameEndedMismatch { expected: bool, actual: bool },

    #[error("Final score mismatch: expected {expected:?}, got {actual:?}")]
    ScoreMismatch { expected: Vec<u32>, actual: [u32; 2] },

    #[error("Final digest mismatch: expected {expected:#x}, got {actual:#x}")]
    FinalDigestMismatch { expected: u64, actual: u64 },
}

/// Controller type produced by [`replay_match`].
pub type ReplayedMatch<E> = MatchController<RecordedInputs, E, ReplayRecorder>;

/// Re-execute a replay artifact and return the controller in its final state.
///
/// Only structural checks run here; outcome checks are [`verify_replay`]'s.
pub fn replay_match<E>(artifact: &ReplayArtifact) -> Result<ReplayedMatch<E>, VerifyError>
where
    E: PhysicsEngine + Default,
{
    let metadata = artifact
        .metadata
        .as_ref()
        .ok_or(VerifyError::MissingMetadata)?;
    let settings = artifact
        .settings
        .as_ref()
        .ok_or(VerifyError::MissingSettings)?;

    for (what, expected, actual) in [
        ("rng algorithm", RNG_ALGORITHM, &artifact.rng_algorithm),
        (
            "state digest algorithm",
            STATE_DIGEST_ALGO_ID,
            &artifact.state_digest_algo_id,
        ),
    ] {
        if actual != expected {
            return Err(VerifyError::AlgorithmMismatch {
                what,
                expected,
                actual: actual.clone(),
            });
        }
    }

    let frames = artifact
        .frame_inputs()
        .map_err(|reason| VerifyError::InvalidInput {
            reason: reason.to_string(),
        })?;
    let frame_count = frames.len() as Frame;
    if frame_count != artifact.frame_count {
        return Err(VerifyError::FrameCountMismatch {
            expected: artifact.frame_count,
            actual: frame_count,
        });
    }

    let config = MatchConfig::from_settings(
        settings,
        [metadata.nickname1.clone(), metadata.nickname2.clone()],
    );
    config.validate()?;

    let mut controller = MatchController::with_parts(
        config,
        RecordedInputs::new(frames),
        E::default(),
        ReplayRecorder::new(),
        Box::new(FixedRoomId(metadata.room_id.clone())),
    );
    controller.restart_with_room_id(&metadata.room_id);

    let mut toggles = artifact.practice_mode_changes.iter().peekable();
    for frame in 0..frame_count {
        while let Some(toggle) = toggles.next_if(|t| t.frame <= frame) {
            controller.set_practice_mode(toggle.enabled);
        }
        controller.advance_one_frame();
    }
    for toggle in toggles {
        controller.set_practice_mode(toggle.enabled);
    }

    Ok(controller)
}

/// Verify a replay artifact reproduces its recorded outcome on the reference
/// court.
pub fn verify_replay(artifact: &ReplayArtifact) -> Result<(), VerifyError> {
    verify_replay_with::<Court>(artifact)
}

/// Verify a replay artifact against engine `E`.
pub fn verify_replay_with<E>(artifact: &ReplayArtifact) -> Result<(), VerifyError>
where
    E: PhysicsEngine + Default,
{
    let controller = replay_match::<E>(artifact)?;
    let rerecorded = controller.replay_artifact();

    if let Some(frame) = rerecorded
        .inputs
        .iter()
        .zip(&artifact.inputs)
        .position(|(a, b)| a != b)
    {
        tracing::warn!(frame, "replay input stream diverged");
        return Err(VerifyError::InputStreamDiverged {
            frame: frame as Frame,
        });
    }
    if rerecorded.inputs.len() != artifact.inputs.len() {
        let frame = rerecorded.inputs.len().min(artifact.inputs.len());
        tracing::warn!(frame, "replay input stream length diverged");
        return Err(VerifyError::InputStreamDiverged {
            frame: frame as Frame,
        });
    }
    if rerecorded.practice_mode_changes != artifact.practice_mode_changes {
        tracing::warn!("replay practice toggles diverged");
        return Err(VerifyError::PracticeTogglesDiverged);
    }

    let outcome = controller.outcome();
    if artifact.game_ended != outcome.game_ended {
        tracing::warn!(
            expected = artifact.game_ended,
            actual = outcome.game_ended,
            "replay game end mismatch"
        );
        return Err(VerifyError::GameEndedMismatch {
            expected: artifact.game_ended,
            actual: outcome.game_ended,
        });
    }

    let scores = outcome.scores;
    if artifact.final_scores != scores {
        tracing::warn!(expected = ?artifact.final_scores, actual = ?scores, "replay score mismatch");
        return Err(VerifyError::ScoreMismatch {
            expected: artifact.final_scores.clone(),
            actual: scores,
        });
    }

    let digest = outcome.final_digest;
    if digest != artifact.final_digest {
        tracing::warn!(
            expected = artifact.final_digest,
            actual = digest,
            "replay digest mismatch"
        );
        return Err(VerifyError::FinalDigestMismatch {
            expected: artifact.final_digest,
            actual: digest,
        });
    }

    tracing::debug!(frames = artifact.frame_count, "replay verified");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
