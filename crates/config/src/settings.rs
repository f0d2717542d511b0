// User settings
// Loaded from ~/.config/pobtrack/settings.json

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Direction
    /// Mode applied to companies without an explicit entry ("OB" or "IB").
    #[serde(rename = "direction.defaultMode")]
    pub default_mode: String,

    /// Per-company overrides, keyed by company name.
    #[serde(rename = "direction.companies")]
    pub companies: BTreeMap<String, String>,

    // Location
    /// Location used when a run config names none.
    #[serde(rename = "location.default", skip_serializing_if = "Option::is_none")]
    pub default_location: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_mode: "OB".to_string(),
            companies: BTreeMap::new(),
            default_location: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pobtrack");
        config_dir.join("settings.json")
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("error parsing {}: {e}; using default settings", path.display());
                        Self::default()
                    }
                }
            }
            Err(e) => {
                log::warn!("error reading {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save current settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Write a commented default settings file unless one exists.
    /// Returns true when a file was written.
    pub fn create_default_file(path: &Path) -> Result<bool, String> {
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let default_config = r#"{
    // Direction applied to companies without an override.
    // "OB": a headcount increase is an outbound flight pending
    // "IB": a headcount increase is the inbound flight itself
    "direction.defaultMode": "OB",

    // Per-company overrides ("OB" or "IB"). Names match case-insensitively.
    "direction.companies": {}
}
"#;

        fs::write(path, default_config).map_err(|e| e.to_string())?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_mode, "OB");
    }

    #[test]
    fn commented_default_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pobtrack/settings.json");
        assert!(Settings::create_default_file(&path).unwrap());
        assert!(!Settings::create_default_file(&path).unwrap(), "existing file is kept");

        let settings = Settings::load_from(&path);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"direction.companies": {"Catering Co": "IB"}}"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.default_mode, "OB");
        assert_eq!(settings.companies["Catering Co"], "IB");
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");
        let mut settings = Settings::default();
        settings.default_mode = "IB".into();
        settings.default_location = Some("alpha".into());
        settings.companies.insert("Wireline".into(), "OB".into());
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn config_path_ends_with_app_dir() {
        let path = Settings::config_path();
        assert!(path.ends_with("pobtrack/settings.json"));
    }
}
