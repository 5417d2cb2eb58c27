//! Gameplay tuning threaded into every session.
//!
//! Nothing in here is global: a session copies the values it was started
//! with, so rounds with different settings can run side by side.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Tempo, timing windows and scoring for a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameplayConfig {
    /// Playback tempo in beats per minute. Can be changed live.
    #[serde(default = "GameplayConfig::default_bpm")]
    pub bpm: f64,

    /// Half-width of the hit window, in beats.
    #[serde(default = "GameplayConfig::default_forgiveness")]
    pub forgiveness: f64,

    /// Health at round start; each miss costs one point.
    #[serde(default = "GameplayConfig::default_max_health")]
    pub max_health: u32,

    /// Points awarded per hit note.
    #[serde(default = "GameplayConfig::default_score_increment")]
    pub score_increment: u64,

    /// Ticks a key stays highlighted after a hit or miss.
    #[serde(default = "GameplayConfig::default_key_flash_frames")]
    pub key_flash_frames: u32,

    /// Ticks a ghost marker lives after a hit.
    #[serde(default = "GameplayConfig::default_ghost_fade_frames")]
    pub ghost_fade_frames: u32,

    /// Beats over which the progress marker blends to a new branch colour.
    #[serde(default = "GameplayConfig::default_marker_fade_beats")]
    pub marker_fade_beats: f64,

    /// Offset of the first branch, giving the player time to get ready.
    #[serde(default = "GameplayConfig::default_lead_in_beats")]
    pub lead_in_beats: f64,

    /// How far ahead of the cursor notes are reported as visible.
    #[serde(default = "GameplayConfig::default_visible_beats")]
    pub visible_beats: f64,

    /// Branch a song starts from when none is given.
    #[serde(default = "GameplayConfig::default_first_branch")]
    pub first_branch: String,
}

impl GameplayConfig {
    fn default_bpm() -> f64 {
        120.0
    }

    fn default_forgiveness() -> f64 {
        0.25
    }

    fn default_max_health() -> u32 {
        5
    }

    fn default_score_increment() -> u64 {
        10
    }

    fn default_key_flash_frames() -> u32 {
        10
    }

    fn default_ghost_fade_frames() -> u32 {
        20
    }

    fn default_marker_fade_beats() -> f64 {
        1.0
    }

    fn default_lead_in_beats() -> f64 {
        4.0
    }

    fn default_visible_beats() -> f64 {
        5.0
    }

    fn default_first_branch() -> String {
        "a".to_string()
    }

    /// Reject values that would make the tick loop meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, message: &str| ConfigError::Invalid {
            field: field.to_string(),
            message: message.to_string(),
        };

        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(invalid("gameplay.bpm", "must be a positive number"));
        }
        if !(self.forgiveness.is_finite() && self.forgiveness > 0.0) {
            return Err(invalid("gameplay.forgiveness", "must be a positive number"));
        }
        if self.max_health == 0 {
            return Err(invalid("gameplay.max_health", "must be at least 1"));
        }
        if self.marker_fade_beats < 0.0 || self.lead_in_beats < 0.0 || self.visible_beats < 0.0 {
            return Err(invalid("gameplay", "beat lengths cannot be negative"));
        }
        if self.first_branch.is_empty() {
            return Err(invalid("gameplay.first_branch", "cannot be empty"));
        }
        Ok(())
    }
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            bpm: Self::default_bpm(),
            forgiveness: Self::default_forgiveness(),
            max_health: Self::default_max_health(),
            score_increment: Self::default_score_increment(),
            key_flash_frames: Self::default_key_flash_frames(),
            ghost_fade_frames: Self::default_ghost_fade_frames(),
            marker_fade_beats: Self::default_marker_fade_beats(),
            lead_in_beats: Self::default_lead_in_beats(),
            visible_beats: Self::default_visible_beats(),
            first_branch: Self::default_first_branch(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameplayConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_bpm_rejected() {
        let config = GameplayConfig {
            bpm: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gameplay.bpm"));
    }

    #[test]
    fn zero_health_rejected() {
        let config = GameplayConfig {
            max_health: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_forgiveness_rejected() {
        let config = GameplayConfig {
            forgiveness: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
