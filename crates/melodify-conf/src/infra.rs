//! Infrastructure configuration - where data lives and how loud we log.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem paths for song data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the branch library. Expected layout:
    /// `<branch_dir>/midi/<name>.mid` and `<branch_dir>/json/<name>.json`.
    /// Default: ./branches
    #[serde(default = "PathsConfig::default_branch_dir")]
    pub branch_dir: PathBuf,
}

impl PathsConfig {
    fn default_branch_dir() -> PathBuf {
        PathBuf::from("branches")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            branch_dir: Self::default_branch_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directive (trace, debug, info, warn, error, or an
    /// `EnvFilter` expression such as `melodify=debug`).
    /// Default: warn
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "warn".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
