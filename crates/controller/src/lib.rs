//! Pikavolley Match Controller
//!
//! The match controller advances the game by exactly one frame per
//! [`MatchController::advance_one_frame`] call. It owns:
//! - The phase state machine (intro, menu, round transitions, game end)
//! - Scores, serve and round/game-end bookkeeping
//! - The slow-motion frame skipper
//! - The match RNG, reseeded from the room identifier on restart
//! - Replay input recording
//!
//! # Invocation Order
//!
//! Per invocation: capture input, decide the recording policy, record and/or
//! run the phase handler, and (in Round) step physics and emit sound cues. The
//! order of collaborator calls is part of the determinism contract: replaying
//! the recorded input stream through the same order reproduces the match.

#![deny(unsafe_code)]

pub mod config;
pub mod input;
pub mod phase;
pub mod playback;
pub mod presentation;
pub mod recording;
pub mod room;
pub mod slow_motion;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, MatchConfig};
pub use input::{KeyState, Keyboard, ScriptedInput};
pub use phase::{FrameTotals, GameMode, Phase};
pub use playback::{VerifyError, replay_match, verify_replay};
pub use presentation::{Fade, Pan, PresentationEvent, Sound};
pub use recording::{RecordingContext, RecordingPolicy, recording_policy};
pub use room::{FixedRoomId, RandomRoomIds, RoomIdSource, SequentialRoomIds};
pub use slow_motion::SlowMotion;

use pikavolley_replay::{InputRecorder, MatchOutcome, ReplayRecorder};
use pikavolley_sim::{
    Court, Frame, FrameInputs, GROUND_HALF_WIDTH, InputSource, MatchRng, Observation,
    PhysicsEngine, Side,
};
use pikavolley_wire::ReplayArtifact;

// ============================================================================
// Match State
// ============================================================================

/// Mutable state of one match, exclusively owned by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    pub phase: Phase,
    /// Frames spent in the current phase (or on the end-of-game display).
    pub frame_counter: u32,
    /// Idle menu frames after lock-in.
    pub no_input_frame_counter: u32,
    pub slow_motion: SlowMotion,
    pub scores: [u32; 2],
    pub winning_score: u32,
    pub game_ended: bool,
    pub round_ended: bool,
    pub serving: Side,
    pub selected_mode: GameMode,
    pub practice_mode: bool,
    pub ready_message_visible: bool,
}

impl MatchState {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            phase: Phase::Intro,
            frame_counter: 0,
            no_input_frame_counter: 0,
            slow_motion: SlowMotion::new(config.normal_fps, config.slow_motion_fps),
            scores: [0, 0],
            winning_score: config.winning_score,
            game_ended: false,
            round_ended: false,
            serving: Side::Player1,
            selected_mode: GameMode::VsComputer,
            practice_mode: false,
            ready_message_visible: false,
        }
    }
}

// ============================================================================
// Match Controller
// ============================================================================

/// Deterministic frame controller.
pub struct MatchController<S, E = Court, R = ReplayRecorder> {
    config: MatchConfig,
    state: MatchState,
    engine: E,
    rng: MatchRng,
    input: S,
    recorder: R,
    room_ids: Box<dyn RoomIdSource>,
    room_id: String,
    events: Vec<PresentationEvent>,
    paused: bool,
    /// Non-paused invocations since the last restart.
    invocations: Frame,
    /// Set when the end-of-game display hands over to the intro. The
    /// recording is frozen until the next restart.
    final_outcome: Option<MatchOutcome>,
}

impl<S: InputSource> MatchController<S> {
    /// Controller with the reference court, a replay recorder and random room
    /// identifiers. The match is restarted and sits in the intro.
    pub fn new(config: MatchConfig, input: S) -> Self {
        Self::with_parts(
            config,
            input,
            Court::new(),
            ReplayRecorder::new(),
            Box::new(RandomRoomIds),
        )
    }
}

impl<S: InputSource, E: PhysicsEngine> MatchController<S, E, ReplayRecorder> {
    /// Finalize the recording so far into a replay artifact.
    pub fn replay_artifact(&self) -> ReplayArtifact {
        self.recorder
            .finalize(self.config.settings(), self.outcome())
    }
}

impl<S, E, R> MatchController<S, E, R>
where
    S: InputSource,
    E: PhysicsEngine,
    R: InputRecorder,
{
    pub fn with_parts(
        config: MatchConfig,
        input: S,
        engine: E,
        recorder: R,
        room_ids: Box<dyn RoomIdSource>,
    ) -> Self {
        let mut controller = Self {
            state: MatchState::new(&config),
            config,
            engine,
            rng: MatchRng::default(),
            input,
            recorder,
            room_ids,
            room_id: String::new(),
            events: Vec::new(),
            paused: false,
            invocations: 0,
            final_outcome: None,
        };
        controller.restart();
        controller
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn scores(&self) -> [u32; 2] {
        self.state.scores
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn rng(&self) -> &MatchRng {
        &self.rng
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable engine access. Changes made here are not recorded.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn input_mut(&mut self) -> &mut S {
        &mut self.input
    }

    /// Non-paused invocations since the last restart.
    pub fn invocations(&self) -> Frame {
        self.invocations
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn observation(&self) -> Observation {
        self.engine.observation()
    }

    pub fn state_digest(&self) -> u64 {
        self.engine.state_digest()
    }

    /// Outcome of the finished match, once its end-of-game display is over.
    pub fn final_outcome(&self) -> Option<MatchOutcome> {
        self.final_outcome
    }

    /// The frozen final outcome, or the live one while the match runs.
    pub fn outcome(&self) -> MatchOutcome {
        self.final_outcome.unwrap_or_else(|| MatchOutcome {
            scores: self.state.scores,
            final_digest: self.engine.state_digest(),
            game_ended: self.state.game_ended,
        })
    }

    /// Take all presentation events buffered since the last drain.
    pub fn drain_events(&mut self) -> Vec<PresentationEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------------

    /// Pausing turns [`advance_one_frame`](Self::advance_one_frame) into a
    /// no-op. Nothing is recorded while paused.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Practice mode suppresses scoring. Toggles are recorded with the index
    /// of the next invocation unless the recording is frozen.
    pub fn set_practice_mode(&mut self, enabled: bool) {
        if self.state.practice_mode == enabled {
            return;
        }
        self.state.practice_mode = enabled;
        if self.final_outcome.is_none() {
            self.recorder
                .record_practice_mode(self.invocations, enabled);
        }
        tracing::debug!(enabled, invocation = self.invocations, "practice mode");
    }

    /// Reset everything and start over from the intro under a fresh room
    /// identifier.
    pub fn restart(&mut self) {
        let room_id = self.room_ids.next_room_id(&self.config.room_id_prefix);
        self.restart_with_room_id(&room_id);
    }

    /// Reset everything and start over from the intro under `room_id`.
    pub fn restart_with_room_id(&mut self, room_id: &str) {
        self.recorder.clear();
        self.rng.reseed(room_id);
        self.rng.next_u32();
        self.rng.next_u32();
        let [nickname1, nickname2] = &self.config.nicknames;
        self.recorder.record_metadata(room_id, nickname1, nickname2);

        self.engine.reset();
        let practice_mode = self.state.practice_mode;
        self.state = MatchState::new(&self.config);
        self.invocations = 0;
        self.final_outcome = None;
        self.events.clear();
        self.room_id = room_id.to_string();
        if practice_mode {
            self.state.practice_mode = true;
            self.recorder.record_practice_mode(0, true);
        }

        tracing::debug!(room_id, "match restarted");
    }

    /// Advance the match by one invocation.
    pub fn advance_one_frame(&mut self) {
        if self.paused {
            return;
        }

        let inputs = self.input.capture();
        let skip = self.state.slow_motion.consume_invocation();
        let policy = recording_policy(&RecordingContext {
            phase: self.state.phase,
            game_ended: self.state.game_ended,
            game_end_frames: self.state.frame_counter,
            slow_motion_skip: skip,
            after_step_threshold: self.config.frame_totals.game_end_early_exit,
        });

        if policy == RecordingPolicy::RecordOnly {
            self.record(&inputs);
        }
        if !skip {
            self.run_phase(&inputs, policy);
        }
        self.invocations += 1;
    }

    // ------------------------------------------------------------------------
    // Phase Handlers
    // ------------------------------------------------------------------------

    fn run_phase(&mut self, inputs: &FrameInputs, policy: RecordingPolicy) {
        match self.state.phase {
            Phase::Intro => self.intro(inputs),
            Phase::Menu => self.menu(inputs),
            Phase::AfterMenuSelection => {
                if self.count_frame() {
                    self.enter(Phase::BeforeStartOfNewGame);
                }
            }
            Phase::BeforeStartOfNewGame => {
                if self.count_frame() {
                    self.enter(Phase::StartOfNewGame);
                }
            }
            Phase::StartOfNewGame => self.start_of_new_game(),
            Phase::Round => self.round(inputs, policy),
            Phase::AfterEndOfRound => {
                if self.count_frame() {
                    self.enter(Phase::BeforeStartOfNextRound);
                }
            }
            Phase::BeforeStartOfNextRound => self.before_start_of_next_round(),
        }
    }

    fn intro(&mut self, inputs: &FrameInputs) {
        let budget_spent = self.count_frame();
        if any_power_hit(inputs) || budget_spent {
            self.enter(Phase::Menu);
        }
    }

    fn menu(&mut self, inputs: &FrameInputs) {
        let lock_in = self.config.frame_totals.menu_lock_in;
        let pressed = [inputs[0].power_hit, inputs[1].power_hit];

        self.state.frame_counter += 1;
        if self.state.frame_counter < lock_in && (pressed[0] || pressed[1]) {
            self.state.frame_counter = lock_in;
            return;
        }
        if self.state.frame_counter <= lock_in {
            return;
        }

        let up = inputs.iter().any(|i| i.y_direction == -1);
        let down = inputs.iter().any(|i| i.y_direction == 1);
        if up && self.state.selected_mode == GameMode::VsFriend {
            self.select_mode(GameMode::VsComputer);
        } else if down && self.state.selected_mode == GameMode::VsComputer {
            self.select_mode(GameMode::VsFriend);
        } else {
            self.state.no_input_frame_counter += 1;
        }

        if pressed[0] || pressed[1] {
            let (player1_computer, player2_computer) = match self.state.selected_mode {
                GameMode::VsFriend => (false, false),
                GameMode::VsComputer if pressed[0] => (false, true),
                GameMode::VsComputer => (true, false),
            };
            self.engine
                .set_computer_controlled(player1_computer, player2_computer);
            tracing::info!(
                mode = ?self.state.selected_mode,
                player1_computer,
                player2_computer,
                "menu selection committed"
            );
            self.state.no_input_frame_counter = 0;
            self.enter(Phase::AfterMenuSelection);
            return;
        }

        if self.state.no_input_frame_counter >= self.config.frame_totals.menu_idle {
            self.engine.set_computer_controlled(true, true);
            tracing::info!("menu idle, starting computer demo");
            self.state.no_input_frame_counter = 0;
            self.enter(Phase::StartOfNewGame);
        }
    }

    fn select_mode(&mut self, mode: GameMode) {
        self.state.selected_mode = mode;
        self.state.no_input_frame_counter = 0;
        self.events.push(PresentationEvent::MenuSelection(mode));
    }

    fn start_of_new_game(&mut self) {
        if self.state.frame_counter == 0 {
            self.state.game_ended = false;
            self.state.round_ended = false;
            self.state.serving = Side::Player1;
            self.state.scores = [0, 0];
            self.engine.reset_for_new_game();
            self.engine
                .initialize_for_new_round(Side::Player1, &mut self.rng);
            self.events
                .push(PresentationEvent::ScoresChanged(self.state.scores));
        }
        if self.count_frame() {
            self.enter(Phase::Round);
        }
    }

    fn round(&mut self, inputs: &FrameInputs, policy: RecordingPolicy) {
        let pressed = any_power_hit(inputs);

        if policy == RecordingPolicy::RecordBeforeStep {
            self.record(inputs);
        }
        let ball_touched_ground = self.engine.step_one_frame(inputs, &mut self.rng);
        if policy == RecordingPolicy::RecordAfterStep {
            self.record(inputs);
        }

        let flags = self.engine.take_sound_flags();
        self.events
            .extend(presentation::sound_events(&flags, self.config.stereo_sound));

        if self.state.game_ended {
            self.events.push(PresentationEvent::GameEndMessage {
                frame: self.state.frame_counter,
            });
            let early_exit = self.config.frame_totals.game_end_early_exit;
            let budget_spent = self.count_frame();
            if budget_spent || (self.state.frame_counter >= early_exit && pressed) {
                self.freeze_recording();
                self.enter(Phase::Intro);
            }
            return;
        }

        if ball_touched_ground
            && !self.state.practice_mode
            && !self.state.round_ended
            && !self.state.game_ended
        {
            let scorer = if self.engine.ball_punch_x() < GROUND_HALF_WIDTH {
                Side::Player2
            } else {
                Side::Player1
            };
            self.award_point(scorer);
            self.state.round_ended = true;
        }

        if self.state.round_ended && !self.state.game_ended && !self.state.slow_motion.is_active()
        {
            self.enter(Phase::AfterEndOfRound);
        }
    }

    fn award_point(&mut self, scorer: Side) {
        let before = self.state.scores;
        self.state.scores[scorer.index()] += 1;
        self.state.serving = scorer;

        let delta: u32 = self
            .state
            .scores
            .iter()
            .zip(before)
            .map(|(after, before)| after - before)
            .sum();
        assert_eq!(delta, 1, "a round must change exactly one score by one");

        self.events
            .push(PresentationEvent::ScoresChanged(self.state.scores));
        tracing::info!(
            scorer = ?scorer,
            scores = ?self.state.scores,
            invocation = self.invocations,
            "round ended"
        );

        if self.state.scores[scorer.index()] >= self.state.winning_score {
            self.state.game_ended = true;
            self.state.frame_counter = 0;
            self.engine.mark_game_end(scorer);

            let winners = self.engine.winner_flags();
            assert!(
                winners[scorer.index()] && !winners[scorer.opponent().index()],
                "game end must flag exactly one winner"
            );
            tracing::info!(winner = ?scorer, scores = ?self.state.scores, "game ended");
        } else {
            self.state
                .slow_motion
                .schedule(self.config.slow_motion_frames);
        }
    }

    fn before_start_of_next_round(&mut self) {
        if self.state.frame_counter == 0 {
            self.engine
                .initialize_for_new_round(self.state.serving, &mut self.rng);
        }
        let toggle_interval = self.config.frame_totals.ready_toggle_interval;
        let budget_spent = self.count_frame();

        if self.state.frame_counter % toggle_interval == 0 {
            self.set_ready_message(!self.state.ready_message_visible);
        }
        if budget_spent {
            self.set_ready_message(false);
            self.state.round_ended = false;
            self.enter(Phase::Round);
        }
    }

    fn set_ready_message(&mut self, visible: bool) {
        if self.state.ready_message_visible != visible {
            self.state.ready_message_visible = visible;
            self.events
                .push(PresentationEvent::ReadyMessage { visible });
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Count one frame against the current phase's budget. Returns `true`
    /// once it is spent.
    fn count_frame(&mut self) -> bool {
        let Some(total) = self.state.phase.frame_total(&self.config.frame_totals) else {
            return false;
        };
        self.state.frame_counter += 1;
        assert!(
            self.state.frame_counter <= total,
            "frame counter {} overran budget {total} in {}",
            self.state.frame_counter,
            self.state.phase
        );
        self.state.frame_counter >= total
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(
            from = %self.state.phase,
            to = %phase,
            invocation = self.invocations,
            "phase transition"
        );
        self.state.phase = phase;
        self.state.frame_counter = 0;
        self.events.push(PresentationEvent::PhaseEntered(phase));

        match phase {
            Phase::Menu => {
                self.state.selected_mode = GameMode::VsComputer;
                self.state.no_input_frame_counter = 0;
                self.events
                    .push(PresentationEvent::MenuSelection(GameMode::VsComputer));
            }
            Phase::AfterMenuSelection | Phase::AfterEndOfRound => {
                self.events.push(PresentationEvent::Fade(Fade::ToBlack));
            }
            Phase::StartOfNewGame | Phase::BeforeStartOfNextRound => {
                self.events.push(PresentationEvent::Fade(Fade::FromBlack));
            }
            Phase::Intro | Phase::BeforeStartOfNewGame | Phase::Round => {}
        }
    }

    fn freeze_recording(&mut self) {
        if self.final_outcome.is_some() {
            return;
        }
        let outcome = self.outcome();
        self.final_outcome = Some(outcome);
        tracing::info!(
            room_id = %self.room_id,
            scores = ?outcome.scores,
            frames = self.invocations + 1,
            "match finished, recording frozen"
        );
    }

    fn record(&mut self, inputs: &FrameInputs) {
        if self.final_outcome.is_some() {
            return;
        }
        tracing::trace!(
            invocation = self.invocations,
            phase = %self.state.phase,
            "record inputs"
        );
        self.recorder.append_inputs(&inputs[0], &inputs[1]);
    }
}

fn any_power_hit(inputs: &FrameInputs) -> bool {
    inputs.iter().any(|i| i.power_hit)
}

// ============================================================================
// Tests
// ============================================================================
