//! Match phases and their frame budgets.

use pikavolley_wire::FrameTotalsProto;
use serde::Deserialize;

/// The eight phases of the match state machine. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Intro,
    Menu,
    AfterMenuSelection,
    BeforeStartOfNewGame,
    StartOfNewGame,
    Round,
    AfterEndOfRound,
    BeforeStartOfNextRound,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Menu => "menu",
            Self::AfterMenuSelection => "after_menu_selection",
            Self::BeforeStartOfNewGame => "before_start_of_new_game",
            Self::StartOfNewGame => "start_of_new_game",
            Self::Round => "round",
            Self::AfterEndOfRound => "after_end_of_round",
            Self::BeforeStartOfNextRound => "before_start_of_next_round",
        }
    }

    /// Frame budget of this phase, if it has one.
    ///
    /// The menu ends on input only. Round frames are counted only once the
    /// game has ended, against the end-of-game display.
    pub fn frame_total(self, totals: &FrameTotals) -> Option<u32> {
        match self {
            Self::Intro => Some(totals.intro),
            Self::AfterMenuSelection => Some(totals.after_menu_selection),
            Self::BeforeStartOfNewGame => Some(totals.before_start_of_new_game),
            Self::StartOfNewGame => Some(totals.start_of_new_game),
            Self::AfterEndOfRound => Some(totals.after_end_of_round),
            Self::BeforeStartOfNextRound => Some(totals.before_start_of_next_round),
            Self::Round => Some(totals.game_end),
            Self::Menu => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Menu choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
    #[default]
    VsComputer,
    VsFriend,
}

/// Frame budgets and thresholds of the timed phases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrameTotals {
    pub intro: u32,
    pub after_menu_selection: u32,
    pub before_start_of_new_game: u32,
    pub start_of_new_game: u32,
    pub after_end_of_round: u32,
    pub before_start_of_next_round: u32,
    /// Length of the end-of-game message inside Round.
    pub game_end: u32,
    /// Game-end frames after which an action press exits early.
    pub game_end_early_exit: u32,
    /// Menu frames before a selection can be made.
    pub menu_lock_in: u32,
    /// Idle menu frames (after lock-in) before the computer demo starts.
    pub menu_idle: u32,
    pub ready_toggle_interval: u32,
}

impl Default for FrameTotals {
    fn default() -> Self {
        Self {
            intro: 165,
            after_menu_selection: 15,
            before_start_of_new_game: 15,
            start_of_new_game: 71,
            after_end_of_round: 5,
            before_start_of_next_round: 30,
            game_end: 211,
            game_end_early_exit: 70,
            menu_lock_in: 71,
            menu_idle: 225,
            ready_toggle_interval: 5,
        }
    }
}

impl From<&FrameTotals> for FrameTotalsProto {
    fn from(totals: &FrameTotals) -> Self {
        Self {
            intro: totals.intro,
            after_menu_selection: totals.after_menu_selection,
            before_start_of_new_game: totals.before_start_of_new_game,
            start_of_new_game: totals.start_of_new_game,
            after_end_of_round: totals.after_end_of_round,
            before_start_of_next_round: totals.before_start_of_next_round,
            game_end: totals.game_end,
            game_end_early_exit: totals.game_end_early_exit,
            menu_lock_in: totals.menu_lock_in,
            menu_idle: totals.menu_idle,
            ready_toggle_interval: totals.ready_toggle_interval,
        }
    }
}

impl From<&FrameTotalsProto> for FrameTotals {
    fn from(proto: &FrameTotalsProto) -> Self {
        Self {
            intro: proto.intro,
            after_menu_selection: proto.after_menu_selection,
            before_start_of_new_game: proto.before_start_of_new_game,
            start_of_new_game: proto.start_of_new_game,
            after_end_of_round: proto.after_end_of_round,
            before_start_of_next_round: proto.before_start_of_next_round,
            game_end: proto.game_end,
            game_end_early_exit: proto.game_end_early_exit,
            menu_lock_in: proto.menu_lock_in,
            menu_idle: proto.menu_idle,
            ready_toggle_interval: proto.ready_toggle_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phase_is_intro() {
        assert_eq!(Phase::default(), Phase::Intro);
    }

    #[test]
    fn test_phase_frame_totals() {
        let totals = FrameTotals::default();
        assert_eq!(Phase::Menu.frame_total(&totals), None);
        assert_eq!(Phase::Round.frame_total(&totals), Some(211));
        assert_eq!(Phase::Intro.frame_total(&totals), Some(165));
        assert_eq!(Phase::BeforeStartOfNextRound.frame_total(&totals), Some(30));
    }

    #[test]
    fn test_frame_totals_proto_conversion() {
        let totals = FrameTotals {
            game_end: 300,
            ..FrameTotals::default()
        };
        let proto = FrameTotalsProto::from(&totals);
        assert_eq!(proto.game_end, 300);
        assert_eq!(FrameTotals::from(&proto), totals);
    }
}
