//! Configuration: daemon settings and the persisted point list.
//!
//! Two documents with different lifetimes. The settings file (TOML) holds
//! deployment-time choices -- most importantly which injection strategy the
//! dispatcher uses. The point store (JSON) holds the ordered list of
//! configured points and is what the editor tooling reads and writes; a
//! missing store loads as an empty list so a fresh install starts clean.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::platform::InjectionStrategy;
use crate::point::ActionPoint;

/// Settings file searched for next to the working directory by default.
pub const DEFAULT_SETTINGS_FILE: &str = "clickpoint.toml";

const POINTS_FILE: &str = "points.json";
const APP_DIR: &str = "clickpoint";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: io::Error,
    },
    /// TOML parse failure; the message carries line/column from the parser.
    #[error("invalid settings in {path}: {source}")]
    Settings {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid point store {path}: {source}")]
    Points {
        path: PathBuf,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Deployment-time configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Injection strategy; `post-message` unless overridden.
    #[serde(default)]
    pub strategy: InjectionStrategy,
    /// Override for the point-store location.
    #[serde(default)]
    pub points_file: Option<PathBuf>,
}

/// Loads settings from `path`, or defaults when `path` is `None` and the
/// default file does not exist. An explicitly given path must exist.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
            log::debug!("config: no {} present, using defaults", path.display());
            return Ok(Settings::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    toml::from_str(&text).map_err(|source| ConfigError::Settings { path, source })
}

// ---------------------------------------------------------------------------
// Point store
// ---------------------------------------------------------------------------

/// Default point-store location: `%APPDATA%\clickpoint\points.json`, falling
/// back to the working directory when `APPDATA` is unset.
pub fn default_points_path() -> PathBuf {
    match std::env::var_os("APPDATA") {
        Some(appdata) => Path::new(&appdata).join(APP_DIR).join(POINTS_FILE),
        None => PathBuf::from(POINTS_FILE),
    }
}

/// Loads the ordered point list. A missing file is an empty list.
pub fn load_points(path: &Path) -> Result<Vec<ActionPoint>, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text).map_err(|source| ConfigError::Points {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the point list, creating the parent directory if needed.
pub fn save_points(path: &Path, points: &[ActionPoint]) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }
    let json = serde_json::to_string_pretty(points).map_err(|source| ConfigError::Points {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(write_err)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::MouseAction;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("clickpoint-{}-{name}", std::process::id()))
    }

    #[test]
    fn settings_parse_strategy_values() {
        let s: Settings = toml::from_str("strategy = \"send-input\"").unwrap();
        assert_eq!(s.strategy, InjectionStrategy::SendInput);
        let s: Settings = toml::from_str("strategy = \"post-message\"").unwrap();
        assert_eq!(s.strategy, InjectionStrategy::PostMessage);
    }

    #[test]
    fn settings_default_to_post_message() {
        let s: Settings = toml::from_str("").unwrap();
        assert_eq!(s.strategy, InjectionStrategy::PostMessage);
        assert!(s.points_file.is_none());
    }

    #[test]
    fn unknown_settings_keys_are_rejected() {
        assert!(toml::from_str::<Settings>("stragety = \"send-input\"").is_err());
    }

    #[test]
    fn explicit_settings_path_must_exist() {
        let missing = scratch_path("missing.toml");
        assert!(load_settings(Some(&missing)).is_err());
    }

    #[test]
    fn missing_point_store_loads_empty() {
        let missing = scratch_path("missing.json");
        assert!(load_points(&missing).unwrap().is_empty());
    }

    #[test]
    fn point_store_round_trips() {
        let path = scratch_path("store/points.json");
        let mut point = ActionPoint::new(12, 34, "roundtrip");
        point.action = MouseAction::DoubleClick;
        point.repeat_count = 2;
        point.target_application_name = "notepad".into();

        save_points(&path, &[point]).unwrap();
        let loaded = load_points(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "roundtrip");
        assert_eq!(loaded[0].action, MouseAction::DoubleClick);
        assert_eq!(loaded[0].target_application_name, "notepad");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_point_store_is_an_error() {
        let path = scratch_path("corrupt.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_points(&path).is_err());
        let _ = fs::remove_file(&path);
    }
}
