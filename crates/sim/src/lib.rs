//! Pikavolley Simulation Core
//!
//! This crate contains the deterministic, frame-stepped court simulation and
//! the value types exchanged with the match controller.
//!
//! # Architecture Constraints
//!
//! The Simulation Core MUST NOT:
//! - Perform I/O operations (file, network, etc.)
//! - Read wall-clock time
//! - Use ambient/unseeded randomness (all draws go through [`MatchRng`])
//! - Depend on frame rate or variable delta time
//!
//! Physics uses integer arithmetic only, so identical inputs and an identical
//! RNG seed reproduce identical state on every platform.

#![deny(unsafe_code)]

pub mod ball;
pub mod computer;
pub mod court;
pub mod player;
pub mod rng;

pub use ball::{Ball, BallSounds};
pub use court::{
    BALL_RADIUS, BALL_TOUCHING_GROUND_Y, Court, GROUND_HALF_WIDTH, GROUND_WIDTH,
    NET_PILLAR_HALF_WIDTH, NET_PILLAR_TOP_BOTTOM_Y, NET_PILLAR_TOP_TOP_Y, PLAYER_HALF_LENGTH,
    PLAYER_TOUCHING_GROUND_Y,
};
pub use player::{Player, PlayerSounds, PlayerState};
pub use rng::{MatchRng, RNG_ALGORITHM};

// ============================================================================
// Type Aliases
// ============================================================================

/// Index of a controller invocation; the atomic unit of match time.
pub type Frame = u64;

/// Both players' inputs for one frame, player 1 first.
pub type FrameInputs = [InputSnapshot; 2];

// ============================================================================
// Core Types
// ============================================================================

/// Court side of a player. Player 1 plays on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Player1,
    Player2,
}

impl Side {
    /// Array index of this side in per-player arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Player1 => 0,
            Self::Player2 => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
        }
    }
}

/// Per-frame, per-player captured input.
///
/// Directions are always one of `-1`, `0`, `1`. `y_direction == -1` means up
/// (jump). `power_hit` is edge-triggered by the capture layer: it is `true`
/// only on the frame the action key went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InputSnapshot {
    pub x_direction: i8,
    pub y_direction: i8,
    pub power_hit: bool,
}

/// Bit flags of the 5-bit packed input form.
const BIT_LEFT: u8 = 1;
const BIT_RIGHT: u8 = 2;
const BIT_UP: u8 = 4;
const BIT_DOWN: u8 = 8;
const BIT_POWER_HIT: u8 = 16;

impl InputSnapshot {
    /// An input with no direction and no action.
    pub const IDLE: Self = Self {
        x_direction: 0,
        y_direction: 0,
        power_hit: false,
    };

    /// Create a snapshot, collapsing each direction to its sign.
    pub fn new(x_direction: i8, y_direction: i8, power_hit: bool) -> Self {
        Self {
            x_direction: x_direction.signum(),
            y_direction: y_direction.signum(),
            power_hit,
        }
    }

    /// Pack into 5 bits: left=1, right=2, up=4, down=8, power_hit=16.
    pub fn to_bits(self) -> u8 {
        let mut bits = 0;
        match self.x_direction.signum() {
            -1 => bits |= BIT_LEFT,
            1 => bits |= BIT_RIGHT,
            _ => {}
        }
        match self.y_direction.signum() {
            -1 => bits |= BIT_UP,
            1 => bits |= BIT_DOWN,
            _ => {}
        }
        if self.power_hit {
            bits |= BIT_POWER_HIT;
        }
        bits
    }

    /// Unpack from the 5-bit form. Opposite directions cancel out.
    pub fn from_bits(bits: u8) -> Self {
        let axis = |negative: u8, positive: u8| -> i8 {
            i8::from(bits & positive != 0) - i8::from(bits & negative != 0)
        };
        Self {
            x_direction: axis(BIT_LEFT, BIT_RIGHT),
            y_direction: axis(BIT_UP, BIT_DOWN),
            power_hit: bits & BIT_POWER_HIT != 0,
        }
    }

    /// Whether any direction or the action key is active.
    pub fn is_active(self) -> bool {
        self != Self::IDLE
    }
}

/// Pack both players' inputs into one word: `p1 | p2 << 5`.
pub fn pack_frame_inputs(inputs: &FrameInputs) -> u32 {
    u32::from(inputs[0].to_bits()) | (u32::from(inputs[1].to_bits()) << 5)
}

/// Inverse of [`pack_frame_inputs`]. Returns `None` if bits above the
/// 10 used ones are set.
pub fn unpack_frame_inputs(packed: u32) -> Option<FrameInputs> {
    if packed >> 10 != 0 {
        return None;
    }
    Some([
        InputSnapshot::from_bits((packed & 0x1f) as u8),
        InputSnapshot::from_bits(((packed >> 5) & 0x1f) as u8),
    ])
}

// ============================================================================
// Collaborator Interfaces
// ============================================================================

/// Input-capture collaborator, queried exactly once per controller
/// invocation. The returned pair is frozen for the whole frame.
pub trait InputSource {
    fn capture(&mut self) -> FrameInputs;
}

/// One-shot sound cues raised by the engine during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoundFlags {
    pub players: [PlayerSounds; 2],
    pub ball: BallSounds,
    /// Horizontal position of the last punch/ground effect, used for panning.
    pub ball_punch_x: i32,
}

/// Physics/round engine driven by the match controller.
///
/// Every method that draws randomness takes the match RNG explicitly; the
/// controller owns the call order, which is part of the determinism contract.
pub trait PhysicsEngine {
    /// Full reset to the power-on state (both players computer controlled).
    fn reset(&mut self);

    /// Assign human/computer roles.
    fn set_computer_controlled(&mut self, player1: bool, player2: bool);

    /// Clear winner/game-end flags before a new game.
    fn reset_for_new_game(&mut self);

    /// Place players and ball for a serve.
    fn initialize_for_new_round(&mut self, serving: Side, rng: &mut MatchRng);

    /// Advance one tick. Returns `true` if the ball touched the ground.
    fn step_one_frame(&mut self, inputs: &FrameInputs, rng: &mut MatchRng) -> bool;

    /// Horizontal position of the last ball punch/ground effect.
    fn ball_punch_x(&self) -> i32;

    /// Flag both players as game-ended with the given winner.
    fn mark_game_end(&mut self, winner: Side);

    /// Winner flags, player 1 first.
    fn winner_flags(&self) -> [bool; 2];

    /// Read and clear all one-shot sound flags.
    fn take_sound_flags(&mut self) -> SoundFlags;

    /// Observation vector of the current state.
    fn observation(&self) -> Observation;

    /// Digest of the current state. Defaults to hashing the observation.
    fn state_digest(&self) -> u64 {
        self.observation().digest()
    }
}

// ============================================================================
// Observation
// ============================================================================

/// Number of fields in a flattened [`Observation`].
pub const OBSERVATION_LEN: usize = 27;

/// Kinematic/state fields of one player, in observation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerObservation {
    pub x: i32,
    pub y: i32,
    pub y_velocity: i32,
    pub diving_direction: i32,
    pub lying_down_duration_left: i32,
    pub frame_number: i32,
    pub delay_before_next_frame: i32,
    pub prev_power_hit: bool,
    pub state: PlayerState,
}

/// Kinematic/state fields of the ball, in observation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BallObservation {
    pub x: i32,
    pub y: i32,
    pub previous_x: i32,
    pub previous_y: i32,
    pub previous_previous_x: i32,
    pub previous_previous_y: i32,
    pub x_velocity: i32,
    pub y_velocity: i32,
    pub is_power_hit: bool,
}

/// Observation vector for external AI/analysis consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observation {
    pub players: [PlayerObservation; 2],
    pub ball: BallObservation,
}

impl Observation {
    /// Integer fields in the fixed order: each player, then the ball.
    pub fn fields(&self) -> [i32; OBSERVATION_LEN] {
        let mut out = [0; OBSERVATION_LEN];
        let mut i = 0;
        let mut push = |v: i32| {
            out[i] = v;
            i += 1;
        };
        for p in &self.players {
            push(p.x);
            push(p.y);
            push(p.y_velocity);
            push(p.diving_direction);
            push(p.lying_down_duration_left);
            push(p.frame_number);
            push(p.delay_before_next_frame);
            push(i32::from(p.prev_power_hit));
            push(i32::from(p.state as u8));
        }
        let b = &self.ball;
        push(b.x);
        push(b.y);
        push(b.previous_x);
        push(b.previous_y);
        push(b.previous_previous_x);
        push(b.previous_previous_y);
        push(b.x_velocity);
        push(b.y_velocity);
        push(i32::from(b.is_power_hit));
        out
    }

    /// Flatten into `f64` values, in [`fields`](Self::fields) order.
    pub fn to_array(&self) -> [f64; OBSERVATION_LEN] {
        self.fields().map(f64::from)
    }

    /// FNV-1a digest over the little-endian integer fields.
    pub fn digest(&self) -> u64 {
        let mut hasher = Fnv1a64::new();
        for value in self.fields() {
            hasher.update(&value.to_le_bytes());
        }
        hasher.finish()
    }
}

// ============================================================================
// StateDigest Implementation
// ============================================================================

/// StateDigest algorithm identifier, recorded in replay artifacts.
pub const STATE_DIGEST_ALGO_ID: &str = "statedigest-v2-fnv1a64-le-i32-observation27";

/// FNV-1a 64-bit offset basis.
const FNV1A_OFFSET_BASIS: u64 = 0xcbf29ce484222325;

/// FNV-1a 64-bit prime.
const FNV1A_PRIME: u64 = 0x100000001b3;

/// FNV-1a 64-bit hasher for StateDigest computation.
#[derive(Debug, Clone)]
struct Fnv1a64 {
    state: u64,
}

impl Fnv1a64 {
    fn new() -> Self {
        Self {
            state: FNV1A_OFFSET_BASIS,
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(FNV1A_PRIME);
        }
    }

    fn finish(self) -> u64 {
        self.state
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_new_collapses_to_sign() {
        let input = InputSnapshot::new(5, -3, true);
        assert_eq!(input.x_direction, 1);
        assert_eq!(input.y_direction, -1);
        assert!(input.power_hit);
    }

    #[test]
    fn test_snapshot_bit_layout() {
        assert_eq!(InputSnapshot::IDLE.to_bits(), 0);
        assert_eq!(InputSnapshot::new(-1, 0, false).to_bits(), 1);
        assert_eq!(InputSnapshot::new(1, 0, false).to_bits(), 2);
        assert_eq!(InputSnapshot::new(0, -1, false).to_bits(), 4);
        assert_eq!(InputSnapshot::new(0, 1, false).to_bits(), 8);
        assert_eq!(InputSnapshot::new(0, 0, true).to_bits(), 16);
        assert_eq!(InputSnapshot::new(1, 1, true).to_bits(), 26);
    }

    #[test]
    fn test_opposite_bits_cancel() {
        let input = InputSnapshot::from_bits(BIT_LEFT | BIT_RIGHT | BIT_UP | BIT_DOWN);
        assert_eq!(input, InputSnapshot::IDLE);
    }

    #[test]
    fn test_pack_frame_inputs_layout() {
        let inputs = [
            InputSnapshot::new(-1, 0, false),
            InputSnapshot::new(0, 0, true),
        ];
        assert_eq!(pack_frame_inputs(&inputs), 1 | (16 << 5));
        assert_eq!(unpack_frame_inputs(1 | (16 << 5)), Some(inputs));
    }

    #[test]
    fn test_unpack_rejects_high_bits() {
        assert_eq!(unpack_frame_inputs(1 << 10), None);
        assert_eq!(unpack_frame_inputs(u32::MAX), None);
    }

    #[test]
    fn test_side_index_and_opponent() {
        assert_eq!(Side::Player1.index(), 0);
        assert_eq!(Side::Player2.index(), 1);
        assert_eq!(Side::Player1.opponent(), Side::Player2);
        assert_eq!(Side::Player2.opponent(), Side::Player1);
    }

    #[test]
    fn test_observation_field_order() {
        let mut obs = Observation::default();
        obs.players[0].x = 36;
        obs.players[0].state = PlayerState::Jumping;
        obs.players[1].prev_power_hit = true;
        obs.ball.previous_previous_y = 7;
        obs.ball.is_power_hit = true;

        let flat = obs.to_array();
        assert_eq!(flat.len(), OBSERVATION_LEN);
        assert_eq!(flat[0], 36.0);
        assert_eq!(flat[8], 1.0);
        assert_eq!(flat[9 + 7], 1.0);
        assert_eq!(flat[18 + 5], 7.0);
        assert_eq!(flat[26], 1.0);
    }

    #[test]
    fn test_observation_digest_changes_with_state() {
        let a = Observation::default();
        let mut b = a;
        b.ball.x = 1;
        assert_eq!(a.digest(), Observation::default().digest());
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_digest_hashes_integer_fields() {
        let mut obs = Observation::default();
        obs.players[1].y_velocity = -3;
        obs.ball.is_power_hit = true;

        let mut hasher = Fnv1a64::new();
        for value in obs.fields() {
            hasher.update(&value.to_le_bytes());
        }
        assert_eq!(obs.digest(), hasher.finish());
        assert_eq!(obs.fields()[9 + 2], -3);
        assert_eq!(obs.to_array()[9 + 2], -3.0);
    }
}
