//! Player kinematics and animation state.

use crate::court::{GROUND_HALF_WIDTH, GROUND_WIDTH, PLAYER_HALF_LENGTH, PLAYER_TOUCHING_GROUND_Y};
use crate::{InputSnapshot, MatchRng, PlayerObservation, Side};

/// Discrete player state. The numeric value is part of the observation vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PlayerState {
    #[default]
    Normal = 0,
    Jumping = 1,
    JumpingAndPowerHitting = 2,
    Diving = 3,
    LyingDownAfterDiving = 4,
    Win = 5,
    Lost = 6,
}

/// One-shot sound flags raised by a player this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerSounds {
    pub pipikachu: bool,
    pub pika: bool,
    pub chu: bool,
}

/// A player on the court.
#[derive(Debug, Clone)]
pub struct Player {
    pub side: Side,
    pub is_computer: bool,
    pub x: i32,
    pub y: i32,
    pub y_velocity: i32,
    pub is_collision_with_ball_happened: bool,
    pub state: PlayerState,
    pub frame_number: i32,
    pub normal_status_arm_swing_direction: i32,
    pub delay_before_next_frame: i32,
    pub lying_down_duration_left: i32,
    pub diving_direction: i32,
    pub prev_power_hit: bool,
    pub is_winner: bool,
    pub game_ended: bool,
    /// Boldness of the computer policy, redrawn every round.
    pub computer_boldness: i32,
    pub sound: PlayerSounds,
}

impl Player {
    pub fn new(side: Side, is_computer: bool) -> Self {
        Self {
            side,
            is_computer,
            x: Self::serve_x(side),
            y: PLAYER_TOUCHING_GROUND_Y,
            y_velocity: 0,
            is_collision_with_ball_happened: false,
            state: PlayerState::Normal,
            frame_number: 0,
            normal_status_arm_swing_direction: 1,
            delay_before_next_frame: 0,
            lying_down_duration_left: -1,
            diving_direction: 0,
            prev_power_hit: false,
            is_winner: false,
            game_ended: false,
            computer_boldness: 0,
            sound: PlayerSounds::default(),
        }
    }

    fn serve_x(side: Side) -> i32 {
        match side {
            Side::Player1 => 36,
            Side::Player2 => GROUND_WIDTH - 36,
        }
    }

    pub fn is_player2(&self) -> bool {
        self.side == Side::Player2
    }

    /// Reset position and animation for a serve. Draws one RNG value.
    pub fn initialize_for_new_round(&mut self, rng: &mut MatchRng) {
        self.x = Self::serve_x(self.side);
        self.y = PLAYER_TOUCHING_GROUND_Y;
        self.y_velocity = 0;
        self.is_collision_with_ball_happened = false;
        self.state = PlayerState::Normal;
        self.frame_number = 0;
        self.normal_status_arm_swing_direction = 1;
        self.delay_before_next_frame = 0;
        self.lying_down_duration_left = -1;
        self.diving_direction = 0;
        self.prev_power_hit = false;
        self.computer_boldness = rng.rand() % 5;
    }

    /// Apply one frame of movement for the given input.
    pub fn apply_movement(&mut self, input: &InputSnapshot) {
        let x_direction = i32::from(input.x_direction);
        let y_direction = i32::from(input.y_direction);

        if self.state == PlayerState::LyingDownAfterDiving {
            self.lying_down_duration_left -= 1;
            if self.lying_down_duration_left < -1 {
                self.state = PlayerState::Normal;
            }
            self.prev_power_hit = input.power_hit;
            return;
        }

        // Horizontal movement
        let velocity_x = match self.state {
            PlayerState::Normal | PlayerState::Jumping | PlayerState::JumpingAndPowerHitting => {
                x_direction * 6
            }
            PlayerState::Diving => self.diving_direction * 8,
            _ => 0,
        };
        self.x = self.clamp_x(self.x + velocity_x);

        // Jump
        if matches!(
            self.state,
            PlayerState::Normal | PlayerState::Jumping | PlayerState::JumpingAndPowerHitting
        ) && y_direction == -1
            && self.y == PLAYER_TOUCHING_GROUND_Y
        {
            self.y_velocity = -16;
            self.state = PlayerState::Jumping;
            self.frame_number = 0;
            self.sound.chu = true;
        }

        // Gravity and landing
        let future_y = self.y + self.y_velocity;
        self.y = future_y;
        if future_y < PLAYER_TOUCHING_GROUND_Y {
            self.y_velocity += 1;
        } else if future_y > PLAYER_TOUCHING_GROUND_Y {
            self.y_velocity = 0;
            self.y = PLAYER_TOUCHING_GROUND_Y;
            self.frame_number = 0;
            if self.state == PlayerState::Diving {
                self.state = PlayerState::LyingDownAfterDiving;
                self.lying_down_duration_left = 3;
            } else {
                self.state = PlayerState::Normal;
            }
        }

        if input.power_hit {
            if self.state == PlayerState::Jumping {
                self.delay_before_next_frame = 5;
                self.frame_number = 0;
                self.state = PlayerState::JumpingAndPowerHitting;
                self.sound.pika = true;
            } else if self.state == PlayerState::Normal && x_direction != 0 {
                self.state = PlayerState::Diving;
                self.frame_number = 0;
                self.diving_direction = x_direction;
                self.y_velocity = -5;
                self.sound.chu = true;
            }
        }

        self.advance_animation();

        if self.game_ended {
            if self.state == PlayerState::Normal {
                if self.is_winner {
                    self.state = PlayerState::Win;
                    self.sound.pipikachu = true;
                } else {
                    self.state = PlayerState::Lost;
                }
                self.delay_before_next_frame = 0;
                self.frame_number = 0;
            }
            self.advance_game_end_animation();
        }

        self.prev_power_hit = input.power_hit;
    }

    fn clamp_x(&self, x: i32) -> i32 {
        let (min, max) = match self.side {
            Side::Player1 => (PLAYER_HALF_LENGTH, GROUND_HALF_WIDTH - PLAYER_HALF_LENGTH),
            Side::Player2 => (
                GROUND_HALF_WIDTH + PLAYER_HALF_LENGTH,
                GROUND_WIDTH - PLAYER_HALF_LENGTH,
            ),
        };
        x.clamp(min, max)
    }

    fn advance_animation(&mut self) {
        match self.state {
            PlayerState::Jumping => {
                self.frame_number = (self.frame_number + 1) % 3;
            }
            PlayerState::JumpingAndPowerHitting => {
                if self.delay_before_next_frame < 1 {
                    self.frame_number += 1;
                    if self.frame_number > 4 {
                        self.frame_number = 0;
                        self.state = PlayerState::Jumping;
                    }
                } else {
                    self.delay_before_next_frame -= 1;
                }
            }
            PlayerState::Normal => {
                self.delay_before_next_frame += 1;
                if self.delay_before_next_frame > 3 {
                    self.delay_before_next_frame = 0;
                    let future = self.frame_number + self.normal_status_arm_swing_direction;
                    if !(0..=4).contains(&future) {
                        self.normal_status_arm_swing_direction =
                            -self.normal_status_arm_swing_direction;
                    }
                    self.frame_number += self.normal_status_arm_swing_direction;
                }
            }
            _ => {}
        }
    }

    fn advance_game_end_animation(&mut self) {
        if self.frame_number < 4 {
            self.delay_before_next_frame += 1;
            if self.delay_before_next_frame > 4 {
                self.delay_before_next_frame = 0;
                self.frame_number += 1;
            }
        }
    }

    pub fn observation(&self) -> PlayerObservation {
        PlayerObservation {
            x: self.x,
            y: self.y,
            y_velocity: self.y_velocity,
            diving_direction: self.diving_direction,
            lying_down_duration_left: self.lying_down_duration_left,
            frame_number: self.frame_number,
            delay_before_next_frame: self.delay_before_next_frame,
            prev_power_hit: self.prev_power_hit,
            state: self.state,
        }
    }
}
