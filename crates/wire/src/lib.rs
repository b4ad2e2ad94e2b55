//! Pikavolley Replay Wire Types
//!
//! This crate defines the Protobuf messages of the replay byte stream. A
//! replay is the one-time match metadata, the settings the controller ran
//! with, and one packed input word per controller invocation.
//!
//! # Input Packing
//!
//! Each player's input packs into 5 bits (left=1, right=2, up=4, down=8,
//! power_hit=16). A frame packs both players as `p1 | p2 << 5`.

#![deny(unsafe_code)]

use pikavolley_sim::{FrameInputs, pack_frame_inputs, unpack_frame_inputs};
use prost::Message;

/// Current replay format version.
pub const REPLAY_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Replay Artifact Types
// ============================================================================

/// Match metadata recorded once at match setup.
#[derive(Clone, PartialEq, Message)]
pub struct ReplayMetadata {
    /// Room identifier; also the RNG seed material.
    #[prost(string, tag = "1")]
    pub room_id: String,

    #[prost(string, tag = "2")]
    pub nickname1: String,

    #[prost(string, tag = "3")]
    pub nickname2: String,
}

/// Phase frame budgets the match ran with.
#[derive(Clone, PartialEq, Message)]
pub struct FrameTotalsProto {
    #[prost(uint32, tag = "1")]
    pub intro: u32,
    #[prost(uint32, tag = "2")]
    pub after_menu_selection: u32,
    #[prost(uint32, tag = "3")]
    pub before_start_of_new_game: u32,
    #[prost(uint32, tag = "4")]
    pub start_of_new_game: u32,
    #[prost(uint32, tag = "5")]
    pub after_end_of_round: u32,
    #[prost(uint32, tag = "6")]
    pub before_start_of_next_round: u32,
    #[prost(uint32, tag = "7")]
    pub game_end: u32,
    #[prost(uint32, tag = "8")]
    pub game_end_early_exit: u32,
    #[prost(uint32, tag = "9")]
    pub menu_lock_in: u32,
    #[prost(uint32, tag = "10")]
    pub menu_idle: u32,
    #[prost(uint32, tag = "11")]
    pub ready_toggle_interval: u32,
}

/// Controller settings that affect the recorded stream.
#[derive(Clone, PartialEq, Message)]
pub struct MatchSettings {
    #[prost(uint32, tag = "1")]
    pub winning_score: u32,

    #[prost(uint32, tag = "2")]
    pub normal_fps: u32,

    #[prost(uint32, tag = "3")]
    pub slow_motion_fps: u32,

    #[prost(uint32, tag = "4")]
    pub slow_motion_frames: u32,

    #[prost(bool, tag = "5")]
    pub stereo_sound: bool,

    #[prost(message, optional, tag = "6")]
    pub frame_totals: Option<FrameTotalsProto>,
}

/// Practice mode toggle, applied before the invocation at `frame`.
#[derive(Clone, PartialEq, Message)]
pub struct PracticeModeChange {
    #[prost(uint64, tag = "1")]
    pub frame: u64,

    #[prost(bool, tag = "2")]
    pub enabled: bool,
}

/// Complete replay artifact.
#[derive(Clone, PartialEq, Message)]
pub struct ReplayArtifact {
    /// Schema version (starts at 1).
    #[prost(uint32, tag = "1")]
    pub replay_format_version: u32,

    #[prost(message, optional, tag = "2")]
    pub metadata: Option<ReplayMetadata>,

    /// RNG algorithm identifier.
    #[prost(string, tag = "3")]
    pub rng_algorithm: String,

    #[prost(message, optional, tag = "4")]
    pub settings: Option<MatchSettings>,

    /// One packed input word per controller invocation.
    #[prost(uint32, repeated, tag = "5")]
    pub inputs: Vec<u32>,

    /// Practice mode toggles, ordered by frame.
    #[prost(message, repeated, tag = "6")]
    pub practice_mode_changes: Vec<PracticeModeChange>,

    /// Scores at the end of the recording, player 1 first.
    #[prost(uint32, repeated, tag = "7")]
    pub final_scores: Vec<u32>,

    /// StateDigest after the last recorded invocation.
    #[prost(uint64, tag = "8")]
    pub final_digest: u64,

    /// Number of recorded invocations; equals `inputs.len()`.
    #[prost(uint64, tag = "9")]
    pub frame_count: u64,

    /// StateDigest algorithm identifier.
    #[prost(string, tag = "10")]
    pub state_digest_algo_id: String,

    /// Whether the game had ended when recording stopped.
    #[prost(bool, tag = "11")]
    pub game_ended: bool,
}

// ============================================================================
// Conversion Helpers
// ============================================================================

impl ReplayArtifact {
    /// Unpack the recorded input stream.
    pub fn frame_inputs(&self) -> Result<Vec<FrameInputs>, &'static str> {
        self.inputs
            .iter()
            .map(|&packed| unpack_frame_inputs(packed).ok_or("packed input uses reserved bits"))
            .collect()
    }

    /// Encode to the replay byte stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Decode from the replay byte stream.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
        Self::decode(bytes)
    }
}

/// Pack a sequence of frames into the artifact input representation.
pub fn pack_inputs<'a>(frames: impl IntoIterator<Item = &'a FrameInputs>) -> Vec<u32> {
    frames.into_iter().map(pack_frame_inputs).collect()
}

// ============================================================================
// Tests
// ============================================================================
