//! Ball kinematics.

use crate::court::{
    BALL_RADIUS, BALL_TOUCHING_GROUND_Y, GROUND_HALF_WIDTH, GROUND_WIDTH, NET_PILLAR_HALF_WIDTH,
    NET_PILLAR_TOP_BOTTOM_Y, NET_PILLAR_TOP_TOP_Y,
};
use crate::{BallObservation, Side};

/// Iteration cap for the landing point prediction.
const LANDING_PREDICTION_LIMIT: u32 = 1000;

/// One-shot sound flags raised by the ball this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BallSounds {
    pub power_hit: bool,
    pub ball_touches_ground: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Ball {
    pub x: i32,
    pub y: i32,
    pub x_velocity: i32,
    pub y_velocity: i32,
    pub expected_landing_point_x: i32,
    pub rotation: i32,
    pub fine_rotation: i32,
    pub punch_effect_x: i32,
    pub punch_effect_y: i32,
    pub punch_effect_radius: i32,
    pub is_power_hit: bool,
    pub previous_x: i32,
    pub previous_y: i32,
    pub previous_previous_x: i32,
    pub previous_previous_y: i32,
    pub sound: BallSounds,
}

impl Ball {
    pub fn new(serving: Side) -> Self {
        let mut ball = Self::default();
        ball.initialize_for_new_round(serving);
        ball
    }

    /// Drop the ball above the serving player.
    pub fn initialize_for_new_round(&mut self, serving: Side) {
        self.x = match serving {
            Side::Player1 => 56,
            Side::Player2 => GROUND_WIDTH - 56,
        };
        self.y = 0;
        self.x_velocity = 0;
        self.y_velocity = 1;
        self.punch_effect_radius = 0;
        self.is_power_hit = false;
        self.previous_x = self.x;
        self.previous_y = self.y;
        self.previous_previous_x = self.x;
        self.previous_previous_y = self.y;
    }

    /// Shift the two-frame position trail.
    pub fn remember_position(&mut self) {
        self.previous_previous_x = self.previous_x;
        self.previous_previous_y = self.previous_y;
        self.previous_x = self.x;
        self.previous_y = self.y;
    }

    /// Move the ball one frame against walls, ceiling, net and ground.
    /// Returns `true` if the ball touched the ground.
    pub fn step_against_world(&mut self) -> bool {
        let mut fine_rotation = self.fine_rotation + self.x_velocity / 2;
        if fine_rotation < 0 {
            fine_rotation += 50;
        } else if fine_rotation > 50 {
            fine_rotation -= 50;
        }
        self.fine_rotation = fine_rotation;
        self.rotation = self.fine_rotation / 10;

        let future_x = self.x + self.x_velocity;
        if future_x < BALL_RADIUS || future_x > GROUND_WIDTH {
            self.x_velocity = -self.x_velocity;
        }

        if self.y + self.y_velocity < 0 {
            self.y_velocity = 1;
        }

        if (self.x - GROUND_HALF_WIDTH).abs() < NET_PILLAR_HALF_WIDTH && self.y > NET_PILLAR_TOP_TOP_Y
        {
            if self.y <= NET_PILLAR_TOP_BOTTOM_Y {
                if self.y_velocity > 0 {
                    self.y_velocity = -self.y_velocity;
                }
            } else if self.x < GROUND_HALF_WIDTH {
                self.x_velocity = -self.x_velocity.abs();
            } else {
                self.x_velocity = self.x_velocity.abs();
            }
        }

        let future_y = self.y + self.y_velocity;
        if future_y > BALL_TOUCHING_GROUND_Y {
            self.sound.ball_touches_ground = true;
            self.y_velocity = -self.y_velocity;
            self.punch_effect_x = self.x;
            self.y = BALL_TOUCHING_GROUND_Y;
            self.punch_effect_radius = BALL_RADIUS;
            self.punch_effect_y = BALL_TOUCHING_GROUND_Y + BALL_RADIUS;
            return true;
        }

        self.y = future_y;
        self.x += self.x_velocity;
        self.y_velocity += 1;
        false
    }

    /// Predict where the ball will land if nothing touches it.
    pub fn update_expected_landing_point(&mut self) {
        let (mut x, mut y) = (self.x, self.y);
        let (mut vx, mut vy) = (self.x_velocity, self.y_velocity);

        for _ in 0..LANDING_PREDICTION_LIMIT {
            let future_x = x + vx;
            if future_x < BALL_RADIUS || future_x > GROUND_WIDTH {
                vx = -vx;
            }
            if y + vy < 0 {
                vy = 1;
            }
            if (x - GROUND_HALF_WIDTH).abs() < NET_PILLAR_HALF_WIDTH && y > NET_PILLAR_TOP_TOP_Y {
                if y < NET_PILLAR_TOP_BOTTOM_Y {
                    if vy > 0 {
                        vy = -vy;
                    }
                } else if x < GROUND_HALF_WIDTH {
                    vx = -vx.abs();
                } else {
                    vx = vx.abs();
                }
            }
            y += vy;
            if y > BALL_TOUCHING_GROUND_Y {
                break;
            }
            x += vx;
            vy += 1;
        }
        self.expected_landing_point_x = x;
    }

    pub fn observation(&self) -> BallObservation {
        BallObservation {
            x: self.x,
            y: self.y,
            previous_x: self.previous_x,
            previous_y: self.previous_y,
            previous_previous_x: self.previous_previous_x,
            previous_previous_y: self.previous_previous_y,
            x_velocity: self.x_velocity,
            y_velocity: self.y_velocity,
            is_power_hit: self.is_power_hit,
        }
    }
}
