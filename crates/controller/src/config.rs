//! Match configuration, loaded from TOML.

use std::path::{Path, PathBuf};

use pikavolley_wire::{FrameTotalsProto, MatchSettings};
use serde::Deserialize;

use crate::phase::FrameTotals;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub winning_score: u32,
    pub normal_fps: u32,
    pub slow_motion_fps: u32,
    /// Slow simulated frames scheduled after each non-final round.
    pub slow_motion_frames: u32,
    pub stereo_sound: bool,
    /// Player nicknames, player 1 first. Recorded in replay metadata.
    pub nicknames: [String; 2],
    pub room_id_prefix: String,
    pub frame_totals: FrameTotals,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            winning_score: 15,
            normal_fps: 30,
            slow_motion_fps: 5,
            slow_motion_frames: 6,
            stereo_sound: true,
            nicknames: ["1P".to_string(), "2P".to_string()],
            room_id_prefix: "DuckLL_AI_GOD_".to_string(),
            frame_totals: FrameTotals::default(),
        }
    }
}

impl MatchConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if it exists, falling back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file found, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded configuration");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "{e}, using defaults");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.winning_score == 0 {
            return invalid("winning_score must be > 0");
        }
        if self.normal_fps == 0 || self.slow_motion_fps == 0 {
            return invalid("normal_fps and slow_motion_fps must be > 0");
        }
        if self.slow_motion_fps > self.normal_fps {
            return invalid("slow_motion_fps must not exceed normal_fps");
        }

        let totals = &self.frame_totals;
        for (name, value) in [
            ("intro", totals.intro),
            ("after_menu_selection", totals.after_menu_selection),
            ("before_start_of_new_game", totals.before_start_of_new_game),
            ("start_of_new_game", totals.start_of_new_game),
            ("after_end_of_round", totals.after_end_of_round),
            (
                "before_start_of_next_round",
                totals.before_start_of_next_round,
            ),
            ("game_end", totals.game_end),
            ("menu_idle", totals.menu_idle),
            ("ready_toggle_interval", totals.ready_toggle_interval),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "frame_totals.{name} must be > 0"
                )));
            }
        }
        if totals.game_end_early_exit > totals.game_end {
            return invalid("frame_totals.game_end_early_exit must not exceed game_end");
        }
        Ok(())
    }

    /// Settings recorded in replay artifacts.
    pub fn settings(&self) -> MatchSettings {
        MatchSettings {
            winning_score: self.winning_score,
            normal_fps: self.normal_fps,
            slow_motion_fps: self.slow_motion_fps,
            slow_motion_frames: self.slow_motion_frames,
            stereo_sound: self.stereo_sound,
            frame_totals: Some(FrameTotalsProto::from(&self.frame_totals)),
        }
    }

    /// Rebuild a config from recorded settings and nicknames.
    pub fn from_settings(settings: &MatchSettings, nicknames: [String; 2]) -> Self {
        Self {
            winning_score: settings.winning_score,
            normal_fps: settings.normal_fps,
            slow_motion_fps: settings.slow_motion_fps,
            slow_motion_frames: settings.slow_motion_frames,
            stereo_sound: settings.stereo_sound,
            nicknames,
            frame_totals: settings
                .frame_totals
                .as_ref()
                .map(FrameTotals::from)
                .unwrap_or_default(),
            ..Self::default()
        }
    }
}
