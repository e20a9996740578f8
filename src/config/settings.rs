use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::config::paths;
use crate::model::enums::ScriptKind;

pub const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_LOG_FILTER: &str = "filter_rules=info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Owner assumed for rule files when the command line does not say.
    pub script_kind: ScriptKind,
    /// `tracing_subscriber::EnvFilter` directives, used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            script_kind: ScriptKind::User,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Loads settings from the user config directory, falling back to defaults.
pub fn load_settings() -> Settings {
    paths::settings_path()
        .map(|path| load_settings_from(&path))
        .unwrap_or_default()
}

pub fn load_settings_from(path: &Path) -> Settings {
    let Ok(data) = fs::read_to_string(path) else {
        debug!(path = %path.display(), "no settings file, using defaults");
        return Settings::default();
    };
    serde_json::from_str(&data).unwrap_or_default()
}

pub fn save_settings(settings: &Settings) -> std::io::Result<()> {
    match paths::settings_path() {
        Some(path) => save_settings_to(&path, settings),
        None => Ok(()),
    }
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(settings)?;
    fs::write(path, data)
}
