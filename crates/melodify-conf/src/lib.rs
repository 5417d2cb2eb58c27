//! Configuration loading for Melodify.
//!
//! Small on purpose: the engine, the CLI and any future front end all
//! import this crate.
//!
//! # Sections
//!
//! - **paths** ([`PathsConfig`]): where the branch library lives.
//! - **telemetry** ([`TelemetryConfig`]): log filter for the binaries.
//! - **gameplay** ([`GameplayConfig`]): tempo, hit window, health and
//!   scoring. A session copies these at construction.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, key by key):
//! 1. `/etc/melodify/config.toml` (system)
//! 2. `~/.config/melodify/config.toml` (user)
//! 3. `./melodify.toml` or the path given with `--config`
//! 4. Environment variables (`MELODIFY_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! branch_dir = "~/melodify/branches"
//!
//! [telemetry]
//! log_level = "info"
//!
//! [gameplay]
//! bpm = 100
//! forgiveness = 0.25
//! max_health = 5
//! ```

pub mod gameplay;
pub mod infra;
pub mod loader;

pub use gameplay::GameplayConfig;
pub use infra::{PathsConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Complete Melodify configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MelodifyConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub gameplay: GameplayConfig,
}

impl MelodifyConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, letting `config_path` stand in for `./melodify.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    ///
    /// The result is validated; an out-of-range gameplay value fails the load.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = MelodifyConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::load_from_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);
        config.gameplay.validate()?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand so the output reads like a hand-written file
        let mut output = String::new();
        let g = &self.gameplay;

        output.push_str("# Melodify Configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!(
            "branch_dir = \"{}\"\n",
            self.paths.branch_dir.display()
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output.push_str("\n[gameplay]\n");
        output.push_str(&format!("bpm = {:?}\n", g.bpm));
        output.push_str(&format!("forgiveness = {:?}\n", g.forgiveness));
        output.push_str(&format!("max_health = {}\n", g.max_health));
        output.push_str(&format!("score_increment = {}\n", g.score_increment));
        output.push_str(&format!("key_flash_frames = {}\n", g.key_flash_frames));
        output.push_str(&format!("ghost_fade_frames = {}\n", g.ghost_fade_frames));
        output.push_str(&format!("marker_fade_beats = {:?}\n", g.marker_fade_beats));
        output.push_str(&format!("lead_in_beats = {:?}\n", g.lead_in_beats));
        output.push_str(&format!("visible_beats = {:?}\n", g.visible_beats));
        output.push_str(&format!("first_branch = \"{}\"\n", g.first_branch));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = MelodifyConfig::default();
        assert_eq!(config.gameplay.max_health, 5);
        assert_eq!(config.gameplay.bpm, 120.0);
        assert_eq!(config.paths.branch_dir, PathBuf::from("branches"));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = MelodifyConfig::default();
        config.gameplay.bpm = 87.5;
        config.gameplay.first_branch = "verse".to_string();

        let rendered = config.to_toml();
        assert!(rendered.contains("[gameplay]"));

        let mut reloaded = MelodifyConfig::default();
        loader::apply_toml(&mut reloaded, &rendered, Path::new("rendered.toml")).unwrap();
        assert_eq!(reloaded, config);
    }
}
