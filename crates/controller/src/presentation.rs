//! One-way presentation events.
//!
//! The controller buffers these for the host to drain after each invocation.
//! Nothing here feeds back into control flow.

use pikavolley_sim::{GROUND_WIDTH, SoundFlags};

use crate::phase::{GameMode, Phase};

/// Ball punches left of this x pan left.
const PAN_LEFT_MAX_X: i32 = GROUND_WIDTH / 4;
/// Ball punches right of this x pan right.
const PAN_RIGHT_MIN_X: i32 = GROUND_WIDTH - GROUND_WIDTH / 4;

/// Stereo position of a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pan {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    PiPiKaChu,
    Pika,
    Chu,
    PowerHit,
    BallTouchesGround,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fade {
    ToBlack,
    FromBlack,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    PhaseEntered(Phase),
    ScoresChanged([u32; 2]),
    MenuSelection(GameMode),
    Fade(Fade),
    ReadyMessage { visible: bool },
    /// End-of-game message, drawn with the display frame index.
    GameEndMessage { frame: u32 },
    Sound { sound: Sound, pan: Pan },
}

/// Pan of a ball sound at horizontal punch position `punch_x`.
pub fn ball_pan(punch_x: i32, stereo: bool) -> Pan {
    if !stereo {
        Pan::Center
    } else if punch_x < PAN_LEFT_MAX_X {
        Pan::Left
    } else if punch_x > PAN_RIGHT_MIN_X {
        Pan::Right
    } else {
        Pan::Center
    }
}

/// Sound events for one step's flags, players first, then the ball.
pub fn sound_events(flags: &SoundFlags, stereo: bool) -> Vec<PresentationEvent> {
    let mut events = Vec::new();
    let player_pans = if stereo {
        [Pan::Left, Pan::Right]
    } else {
        [Pan::Center; 2]
    };

    for (sounds, pan) in flags.players.iter().zip(player_pans) {
        for (raised, sound) in [
            (sounds.pipikachu, Sound::PiPiKaChu),
            (sounds.pika, Sound::Pika),
            (sounds.chu, Sound::Chu),
        ] {
            if raised {
                events.push(PresentationEvent::Sound { sound, pan });
            }
        }
    }

    let pan = ball_pan(flags.ball_punch_x, stereo);
    if flags.ball.power_hit {
        events.push(PresentationEvent::Sound {
            sound: Sound::PowerHit,
            pan,
        });
    }
    if flags.ball.ball_touches_ground {
        events.push(PresentationEvent::Sound {
            sound: Sound::BallTouchesGround,
            pan,
        });
    }
    events
}
