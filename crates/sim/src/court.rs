//! Reference court physics engine.
//!
//! Per tick the order of operations is fixed:
//! 1. shift the ball trail, move the ball against the world
//! 2. for each player (1 then 2): predict landing point, decide computer
//!    input, move
//! 3. for each player (1 then 2): resolve ball/player collision
//!
//! Computer decisions and collision jitter draw from the match RNG in exactly
//! this order.

use crate::computer;
use crate::{
    Ball, FrameInputs, InputSnapshot, MatchRng, Observation, PhysicsEngine, Player, Side,
    SoundFlags,
};

// ============================================================================
// Court Geometry (Normative)
// ============================================================================

pub const GROUND_WIDTH: i32 = 432;
pub const GROUND_HALF_WIDTH: i32 = GROUND_WIDTH / 2;
pub const PLAYER_LENGTH: i32 = 64;
pub const PLAYER_HALF_LENGTH: i32 = PLAYER_LENGTH / 2;
pub const PLAYER_TOUCHING_GROUND_Y: i32 = 244;
pub const BALL_RADIUS: i32 = 20;
pub const BALL_TOUCHING_GROUND_Y: i32 = 252;
pub const NET_PILLAR_HALF_WIDTH: i32 = 25;
pub const NET_PILLAR_TOP_TOP_Y: i32 = 176;
pub const NET_PILLAR_TOP_BOTTOM_Y: i32 = 192;

// ============================================================================
// Court
// ============================================================================

/// Two players and a ball.
#[derive(Debug, Clone)]
pub struct Court {
    players: [Player; 2],
    ball: Ball,
}

impl Court {
    pub fn new() -> Self {
        Self {
            players: [
                Player::new(Side::Player1, true),
                Player::new(Side::Player2, true),
            ],
            ball: Ball::new(Side::Player1),
        }
    }

    pub fn player(&self, side: Side) -> &Player {
        &self.players[side.index()]
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }
}

impl Default for Court {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsEngine for Court {
    fn reset(&mut self) {
        *self = Self::new();
    }

    fn set_computer_controlled(&mut self, player1: bool, player2: bool) {
        self.players[0].is_computer = player1;
        self.players[1].is_computer = player2;
    }

    fn reset_for_new_game(&mut self) {
        for player in &mut self.players {
            player.game_ended = false;
            player.is_winner = false;
        }
    }

    fn initialize_for_new_round(&mut self, serving: Side, rng: &mut MatchRng) {
        for player in &mut self.players {
            player.initialize_for_new_round(rng);
        }
        self.ball.initialize_for_new_round(serving);
    }

    fn step_one_frame(&mut self, inputs: &FrameInputs, rng: &mut MatchRng) -> bool {
        self.ball.remember_position();
        let touched_ground = self.ball.step_against_world();

        let mut applied: FrameInputs = *inputs;
        for (i, player) in self.players.iter_mut().enumerate() {
            self.ball.update_expected_landing_point();
            if player.is_computer {
                applied[i] = computer::decide_input(player, &self.ball, rng);
            }
            player.apply_movement(&applied[i]);
        }

        for (i, player) in self.players.iter_mut().enumerate() {
            if is_ball_touching_player(&self.ball, player) {
                if !player.is_collision_with_ball_happened {
                    resolve_ball_player_collision(&mut self.ball, player, &applied[i], rng);
                    player.is_collision_with_ball_happened = true;
                }
            } else {
                player.is_collision_with_ball_happened = false;
            }
        }

        touched_ground
    }

    fn ball_punch_x(&self) -> i32 {
        self.ball.punch_effect_x
    }

    fn mark_game_end(&mut self, winner: Side) {
        for player in &mut self.players {
            player.game_ended = true;
            player.is_winner = player.side == winner;
        }
    }

    fn winner_flags(&self) -> [bool; 2] {
        [self.players[0].is_winner, self.players[1].is_winner]
    }

    fn take_sound_flags(&mut self) -> SoundFlags {
        let flags = SoundFlags {
            players: [self.players[0].sound, self.players[1].sound],
            ball: self.ball.sound,
            ball_punch_x: self.ball.punch_effect_x,
        };
        for player in &mut self.players {
            player.sound = Default::default();
        }
        self.ball.sound = Default::default();
        flags
    }

    fn observation(&self) -> Observation {
        Observation {
            players: [self.players[0].observation(), self.players[1].observation()],
            ball: self.ball.observation(),
        }
    }
}

fn is_ball_touching_player(ball: &Ball, player: &Player) -> bool {
    (ball.x - player.x).abs() <= PLAYER_HALF_LENGTH && (ball.y - player.y).abs() <= PLAYER_HALF_LENGTH
}

fn resolve_ball_player_collision(
    ball: &mut Ball,
    player: &Player,
    input: &InputSnapshot,
    rng: &mut MatchRng,
) {
    let offset = (ball.x - player.x).abs() / 3;
    ball.x_velocity = if ball.x < player.x { -offset } else { offset };
    if ball.x_velocity == 0 {
        ball.x_velocity = rng.rand() % 3 - 1;
    }

    let abs_y_velocity = ball.y_velocity.abs();
    ball.y_velocity = -abs_y_velocity.max(15);

    if player.state == crate::PlayerState::JumpingAndPowerHitting {
        let speed = (i32::from(input.x_direction).abs() + 1) * 10;
        ball.x_velocity = if ball.x < GROUND_HALF_WIDTH {
            speed
        } else {
            -speed
        };
        ball.punch_effect_x = ball.x;
        ball.punch_effect_y = ball.y;
        ball.y_velocity = abs_y_velocity.max(15) * i32::from(input.y_direction) * 2;
        ball.punch_effect_radius = BALL_RADIUS;
        ball.sound.power_hit = true;
        ball.is_power_hit = true;
    } else {
        ball.is_power_hit = false;
    }

    ball.update_expected_landing_point();
}
