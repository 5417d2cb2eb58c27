//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, MelodifyConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/melodify/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("melodify/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("melodify.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and lay its values over `config`.
pub fn load_from_file(config: &mut MelodifyConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Lay the keys present in `contents` over `config`. Absent keys keep
/// whatever an earlier layer set.
pub fn apply_toml(config: &mut MelodifyConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if let Some(paths) = table.get("paths").and_then(|v| v.as_table()) {
        if let Some(v) = string_field(paths, "paths", "branch_dir")? {
            config.paths.branch_dir = expand_path(&v);
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = string_field(telemetry, "telemetry", "log_level")? {
            config.telemetry.log_level = v;
        }
    }

    if let Some(gameplay) = table.get("gameplay").and_then(|v| v.as_table()) {
        let g = &mut config.gameplay;
        if let Some(v) = float_field(gameplay, "bpm")? {
            g.bpm = v;
        }
        if let Some(v) = float_field(gameplay, "forgiveness")? {
            g.forgiveness = v;
        }
        if let Some(v) = u32_field(gameplay, "max_health")? {
            g.max_health = v;
        }
        if let Some(v) = int_field(gameplay, "score_increment")? {
            g.score_increment = v;
        }
        if let Some(v) = u32_field(gameplay, "key_flash_frames")? {
            g.key_flash_frames = v;
        }
        if let Some(v) = u32_field(gameplay, "ghost_fade_frames")? {
            g.ghost_fade_frames = v;
        }
        if let Some(v) = float_field(gameplay, "marker_fade_beats")? {
            g.marker_fade_beats = v;
        }
        if let Some(v) = float_field(gameplay, "lead_in_beats")? {
            g.lead_in_beats = v;
        }
        if let Some(v) = float_field(gameplay, "visible_beats")? {
            g.visible_beats = v;
        }
        if let Some(v) = string_field(gameplay, "gameplay", "first_branch")? {
            g.first_branch = v;
        }
    }

    Ok(())
}

fn wrong_type(section: &str, key: &str, expected: &str) -> ConfigError {
    ConfigError::Invalid {
        field: format!("{}.{}", section, key),
        message: format!("expected {}", expected),
    }
}

fn string_field(table: &toml::Table, section: &str, key: &str) -> Result<Option<String>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| wrong_type(section, key, "a string")),
    }
}

// TOML distinguishes 120 from 120.0; accept either for beat and tempo values.
fn float_field(table: &toml::Table, key: &str) -> Result<Option<f64>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(toml::Value::Float(f)) => Ok(Some(*f)),
        Some(toml::Value::Integer(i)) => Ok(Some(*i as f64)),
        Some(_) => Err(wrong_type("gameplay", key, "a number")),
    }
}

fn int_field(table: &toml::Table, key: &str) -> Result<Option<u64>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_integer()
            .filter(|i| *i >= 0)
            .map(|i| Some(i as u64))
            .ok_or_else(|| wrong_type("gameplay", key, "a non-negative integer")),
    }
}

fn u32_field(table: &toml::Table, key: &str) -> Result<Option<u32>, ConfigError> {
    match int_field(table, key)? {
        None => Ok(None),
        Some(v) => u32::try_from(v)
            .map(Some)
            .map_err(|_| wrong_type("gameplay", key, "an integer no larger than 4294967295")),
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut MelodifyConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from any key lookup. `apply_env_overrides` passes the
/// process environment; tests pass a map.
pub fn apply_overrides_from<F>(config: &mut MelodifyConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("MELODIFY_BRANCH_DIR") {
        config.paths.branch_dir = expand_path(&v);
        sources.env_overrides.push("MELODIFY_BRANCH_DIR".to_string());
    }

    if let Some(v) = lookup("MELODIFY_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("MELODIFY_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    if let Some(bpm) = lookup("MELODIFY_BPM").and_then(|v| v.parse().ok()) {
        config.gameplay.bpm = bpm;
        sources.env_overrides.push("MELODIFY_BPM".to_string());
    }
    if let Some(forgiveness) = lookup("MELODIFY_FORGIVENESS").and_then(|v| v.parse().ok()) {
        config.gameplay.forgiveness = forgiveness;
        sources.env_overrides.push("MELODIFY_FORGIVENESS".to_string());
    }
    if let Some(health) = lookup("MELODIFY_MAX_HEALTH").and_then(|v| v.parse().ok()) {
        config.gameplay.max_health = health;
        sources.env_overrides.push("MELODIFY_MAX_HEALTH".to_string());
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
