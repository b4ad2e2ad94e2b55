//! Replay input recording policy.
//!
//! Every non-paused invocation records exactly one input pair. The policy only
//! decides where that happens relative to the physics step, so the Nth
//! recorded pair is always the Nth invocation's captured input.

use crate::phase::Phase;

/// Where the invocation's input pair is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingPolicy {
    /// Record; no physics step this invocation.
    RecordOnly,
    /// Record, then step physics.
    RecordBeforeStep,
    /// Step physics, then record.
    RecordAfterStep,
}

/// Inputs to [`recording_policy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingContext {
    pub phase: Phase,
    pub game_ended: bool,
    /// Frames of the end-of-game display shown so far.
    pub game_end_frames: u32,
    pub slow_motion_skip: bool,
    /// Game-end frames after which recording moves behind the step.
    pub after_step_threshold: u32,
}

pub fn recording_policy(ctx: &RecordingContext) -> RecordingPolicy {
    if ctx.phase != Phase::Round || ctx.slow_motion_skip {
        return RecordingPolicy::RecordOnly;
    }
    if ctx.game_ended && ctx.game_end_frames >= ctx.after_step_threshold {
        return RecordingPolicy::RecordAfterStep;
    }
    RecordingPolicy::RecordBeforeStep
}
