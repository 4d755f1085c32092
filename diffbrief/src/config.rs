//! User configuration loaded from `config.toml`.
//!
//! Every failure here is soft: a missing file means defaults, a malformed one
//! logs a warning and also means defaults.

use std::path::{Path, PathBuf};

use diffbrief_core::EngineConfig;
use serde::Deserialize;
use tracing::warn;

/// Top-level layout of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[engine]`: diff and anchoring tunables.
    pub engine: EngineConfig,
    /// `[export]`: defaults for `diffbrief export`.
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Write the export here instead of stdout. Relative paths resolve
    /// against the working tree root.
    pub output: Option<PathBuf>,
}

/// Returns the path to the diffbrief config file.
///
/// Prefers `$XDG_CONFIG_HOME/diffbrief/config.toml`; falls back to
/// `~/.config/diffbrief/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("diffbrief").join("config.toml")
}

/// Loads the config from [`config_path`].
pub fn load() -> Config {
    load_from(&config_path())
}

/// Loads the config at `path`, falling back to defaults on any failure.
pub fn load_from(path: &Path) -> Config {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Config::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read config; using defaults");
            return Config::default();
        }
    };
    match toml::from_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config parse error; using defaults");
            Config::default()
        }
    }
}
