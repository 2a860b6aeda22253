//! Runtime configuration.
//!
//! `Config` is assembled once at startup from CLI flags and the optional
//! theme file, then handed to the app by value.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::model::SortBy;
use crate::source::Query;
use crate::tui::style::Palette;

pub const DEFAULT_INTERVAL_SECS: u64 = 3;

/// Color names for each theme slot, as written in the config file.
///
/// Accepts anything `ratatui` can parse: names (`red`, `lightmagenta`),
/// `#rrggbb` and 256-color indices.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Theme {
    pub selected: String,
    pub cpu_limit: String,
    pub cpu_usage: String,
    pub mem_limit: String,
    pub mem_usage: String,
    pub axis: String,
    pub labels: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            selected: "lightmagenta".to_string(),
            cpu_limit: "red".to_string(),
            cpu_usage: "cyan".to_string(),
            mem_limit: "red".to_string(),
            mem_usage: "cyan".to_string(),
            axis: "darkgray".to_string(),
            labels: "gray".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    theme: Theme,
}

/// What to do when a refresh tick fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Show the error inline and keep polling.
    #[default]
    Continue,
    /// Leave the UI and exit with the error.
    Fatal,
}

/// Everything the app controller needs to run.
#[derive(Debug, Clone)]
pub struct Config {
    pub query: Query,
    pub interval: Duration,
    pub sort_by: SortBy,
    pub error_policy: ErrorPolicy,
    pub palette: Palette,
}

impl Config {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            sort_by: SortBy::default(),
            error_policy: ErrorPolicy::default(),
            palette: Palette::default(),
        }
    }

    /// Sets the refresh interval; zero is rejected.
    pub fn with_interval(mut self, secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::Interval);
        }
        self.interval = Duration::from_secs(secs);
        Ok(self)
    }

    pub fn with_sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_theme(mut self, theme: &Theme) -> Result<Self, ConfigError> {
        self.palette = Palette::from_theme(theme)?;
        Ok(self)
    }
}

/// `$XDG_CONFIG_HOME/kubetop/config.toml`, falling back to
/// `$HOME/.config/kubetop/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|v| !v.is_empty())
                .map(|home| PathBuf::from(home).join(".config"))
        })?;
    Some(base.join("kubetop").join("config.toml"))
}

/// Loads the theme from `path`. A missing file yields the default theme.
pub fn load_theme(path: &Path) -> Result<Theme, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("no config file at {}, using defaults", path.display());
            return Ok(Theme::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            });
        }
    };
    let file: ConfigFile = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    debug!("loaded theme from {}", path.display());
    Ok(file.theme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let theme = load_theme(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(theme, Theme::default());
    }

    #[test]
    fn test_partial_theme_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[theme]\nselected = \"yellow\"\ncpu_usage = \"green\"").unwrap();
        let theme = load_theme(file.path()).unwrap();
        assert_eq!(theme.selected, "yellow");
        assert_eq!(theme.cpu_usage, "green");
        assert_eq!(theme.mem_limit, "red");

        let config = Config::new(Query::nodes()).with_theme(&theme).unwrap();
        assert_eq!(config.palette.selected, Color::Yellow);
        assert_eq!(config.palette.cpu_usage, Color::Green);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[theme\nselected = ").unwrap();
        assert!(matches!(
            load_theme(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_unknown_theme_key_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[theme]\nbackground = \"black\"").unwrap();
        assert!(matches!(
            load_theme(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            Config::new(Query::nodes()).with_interval(0),
            Err(ConfigError::Interval)
        ));
        let config = Config::new(Query::nodes()).with_interval(5).unwrap();
        assert_eq!(config.interval, Duration::from_secs(5));
    }
}
