use std::path::{Path, PathBuf};

use europa_gc::GcConfig;
use serde::{Deserialize, Serialize};

use crate::error::{RuntimeError, RuntimeResult};

pub const CONFIG_FILE_NAME: &str = "europa.toml";

/// Top-level runtime configuration: collector tuning plus whatever knobs a
/// host embedding Europa wants to persist alongside it. Kept serde-derived
/// so a host can ship a `europa.toml` next to its program the way `faxt`
/// ships `faxt.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub gc: GcSettings,

    /// Whether `terminate` on drop re-runs a collection pass to surface use-
    /// after-free bugs in native code during development.
    #[serde(default)]
    pub collect_on_terminate: bool,
}

/// Mirrors [`GcConfig`] field-for-field; a distinct type because `GcConfig`
/// itself doesn't derive `Serialize`/`Deserialize` and has no business
/// depending on `serde` just to be configurable from a file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GcSettings {
    #[serde(default = "default_collect_threshold")]
    pub collect_threshold: usize,
    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,
}

fn default_collect_threshold() -> usize {
    GcConfig::default().collect_threshold
}

fn default_growth_factor() -> f64 {
    GcConfig::default().growth_factor
}

impl Default for GcSettings {
    fn default() -> Self {
        let defaults = GcConfig::default();
        GcSettings {
            collect_threshold: defaults.collect_threshold,
            growth_factor: defaults.growth_factor,
        }
    }
}

impl From<GcSettings> for GcConfig {
    fn from(settings: GcSettings) -> Self {
        GcConfig {
            collect_threshold: settings.collect_threshold,
            growth_factor: settings.growth_factor,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            gc: GcSettings::default(),
            collect_on_terminate: false,
        }
    }
}

impl RuntimeConfig {
    /// Searches the current directory, then `$HOME`, for `europa.toml`,
    /// falling back to defaults if neither has one.
    pub fn load() -> RuntimeResult<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> RuntimeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    pub fn save_to_path(&self, path: &Path) -> RuntimeResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| RuntimeError::Config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    fn find_config_file() -> Option<PathBuf> {
        let cwd = PathBuf::from(CONFIG_FILE_NAME);
        if cwd.exists() {
            return Some(cwd);
        }
        let home = std::env::var_os("HOME")?;
        let candidate = PathBuf::from(home).join(".config").join("europa").join(CONFIG_FILE_NAME);
        candidate.exists().then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_gc_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.gc.collect_threshold, GcConfig::default().collect_threshold);
        assert_eq!(config.gc.growth_factor, GcConfig::default().growth_factor);
    }

    #[test]
    fn round_trips_through_a_saved_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut original = RuntimeConfig::default();
        original.gc.collect_threshold = 256;
        original.collect_on_terminate = true;
        original.save_to_path(&path).unwrap();

        let loaded = RuntimeConfig::load_from_path(&path).unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn loading_a_missing_path_is_an_error() {
        let result = RuntimeConfig::load_from_path(Path::new("/nonexistent/europa.toml"));
        assert!(result.is_err());
    }
}
