//! Instrumented collaborators for controller tests.
//!
//! The engine and recorder append to one shared call log so tests can assert
//! the relative order of recording and physics calls.

use std::cell::RefCell;
use std::rc::Rc;

use pikavolley_replay::InputRecorder;
use pikavolley_sim::{
    BallObservation, BallSounds, Frame, FrameInputs, InputSnapshot, MatchRng, Observation,
    PhysicsEngine, Side, SoundFlags,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Record(FrameInputs),
    Metadata(String, String, String),
    Clear,
    PracticeMode(Frame, bool),
    Reset,
    SetComputer(bool, bool),
    ResetForNewGame,
    InitRound(Side),
    Step(FrameInputs),
    MarkGameEnd(Side),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub fn new_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Physics engine whose ground touches are scripted by the test.
pub struct ScriptedEngine {
    log: CallLog,
    pending_touch: Option<i32>,
    punch_x: i32,
    winners: [bool; 2],
    sounds: SoundFlags,
    steps: u64,
}

impl ScriptedEngine {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            pending_touch: None,
            punch_x: 0,
            winners: [false; 2],
            sounds: SoundFlags::default(),
            steps: 0,
        }
    }

    /// Make the next step report a ground touch at `punch_x`.
    pub fn touch_ground_at(&mut self, punch_x: i32) {
        self.pending_touch = Some(punch_x);
    }
}

impl PhysicsEngine for ScriptedEngine {
    fn reset(&mut self) {
        self.log.borrow_mut().push(Call::Reset);
        self.pending_touch = None;
        self.winners = [false; 2];
        self.steps = 0;
    }

    fn set_computer_controlled(&mut self, player1: bool, player2: bool) {
        self.log
            .borrow_mut()
            .push(Call::SetComputer(player1, player2));
    }

    fn reset_for_new_game(&mut self) {
        self.log.borrow_mut().push(Call::ResetForNewGame);
        self.winners = [false; 2];
    }

    fn initialize_for_new_round(&mut self, serving: Side, rng: &mut MatchRng) {
        self.log.borrow_mut().push(Call::InitRound(serving));
        rng.next_u32();
    }

    fn step_one_frame(&mut self, inputs: &FrameInputs, _rng: &mut MatchRng) -> bool {
        self.log.borrow_mut().push(Call::Step(*inputs));
        self.steps += 1;
        match self.pending_touch.take() {
            Some(x) => {
                self.punch_x = x;
                self.sounds.ball = BallSounds {
                    power_hit: false,
                    ball_touches_ground: true,
                };
                self.sounds.ball_punch_x = x;
                true
            }
            None => false,
        }
    }

    fn ball_punch_x(&self) -> i32 {
        self.punch_x
    }

    fn mark_game_end(&mut self, winner: Side) {
        self.log.borrow_mut().push(Call::MarkGameEnd(winner));
        self.winners = [winner == Side::Player1, winner == Side::Player2];
    }

    fn winner_flags(&self) -> [bool; 2] {
        self.winners
    }

    fn take_sound_flags(&mut self) -> SoundFlags {
        std::mem::take(&mut self.sounds)
    }

    fn observation(&self) -> Observation {
        Observation {
            ball: BallObservation {
                x: self.steps as i32,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Recorder that only logs.
pub struct LoggingRecorder {
    log: CallLog,
}

impl LoggingRecorder {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl InputRecorder for LoggingRecorder {
    fn append_inputs(&mut self, player1: &InputSnapshot, player2: &InputSnapshot) {
        self.log
            .borrow_mut()
            .push(Call::Record([*player1, *player2]));
    }

    fn record_metadata(&mut self, room_id: &str, nickname1: &str, nickname2: &str) {
        self.log.borrow_mut().push(Call::Metadata(
            room_id.to_string(),
            nickname1.to_string(),
            nickname2.to_string(),
        ));
    }

    fn clear(&mut self) {
        self.log.borrow_mut().push(Call::Clear);
    }

    fn record_practice_mode(&mut self, frame: Frame, enabled: bool) {
        self.log
            .borrow_mut()
            .push(Call::PracticeMode(frame, enabled));
    }
}
