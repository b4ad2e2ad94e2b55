//! Input policy for computer-controlled players.
//!
//! This is a positioning policy only: walk to the predicted landing point,
//! jump at a reachable ball and occasionally power-hit or dive. Every random
//! choice is drawn from the match RNG so replays stay reproducible.

use crate::court::{GROUND_HALF_WIDTH, PLAYER_HALF_LENGTH, PLAYER_TOUCHING_GROUND_Y};
use crate::{Ball, InputSnapshot, MatchRng, Player, PlayerState};

/// Horizontal dead zone around the target position.
const STAND_TOLERANCE: i32 = 6;

/// Decide this frame's input for a computer player.
pub fn decide_input(player: &Player, ball: &Ball, rng: &mut MatchRng) -> InputSnapshot {
    let landing_x = ball.expected_landing_point_x;
    let ball_coming_to_me = (landing_x >= GROUND_HALF_WIDTH) == player.is_player2();

    // Stand slightly behind the landing point so the ball is sent toward the net.
    let toward_net = if player.is_player2() { -1 } else { 1 };
    let target_x = if ball_coming_to_me {
        landing_x - toward_net * (8 + 2 * player.computer_boldness)
    } else {
        home_x(player)
    };

    let dx = target_x - player.x;
    let mut x_direction = if dx.abs() <= STAND_TOLERANCE {
        0
    } else {
        dx.signum()
    };
    let mut y_direction = 0;
    let mut power_hit = false;

    let on_ground = player.y == PLAYER_TOUCHING_GROUND_Y;
    let ball_dx = (ball.x - player.x).abs();

    if on_ground && ball_coming_to_me && player.state == PlayerState::Normal {
        let reachable = ball_dx < PLAYER_HALF_LENGTH + 8 && (100..180).contains(&ball.y);
        if reachable && ball.y_velocity > 0 && rng.rand() % 3 != 0 {
            y_direction = -1;
        } else if ball.y > 200 && dx.abs() > 40 && rng.rand() % 4 == 0 {
            // Dive toward a ball that is out of walking reach.
            power_hit = true;
            x_direction = dx.signum();
        }
    } else if player.state == PlayerState::Jumping
        && ball_dx < PLAYER_HALF_LENGTH + 16
        && (ball.y - player.y).abs() < PLAYER_HALF_LENGTH + 16
        && rng.rand() % 5 < player.computer_boldness + 1
    {
        power_hit = true;
        x_direction = toward_net * (rng.rand() % 2);
        y_direction = rng.rand() % 3 - 1;
    }

    InputSnapshot::new(x_direction as i8, y_direction as i8, power_hit)
}

fn home_x(player: &Player) -> i32 {
    if player.is_player2() {
        GROUND_HALF_WIDTH + GROUND_HALF_WIDTH / 2
    } else {
        GROUND_HALF_WIDTH / 2
    }
}
