//! Configuration file handling.
//!
//! One JSON file with an `extraction` and an `analysis` section. Every field
//! has a default, so a partial file only needs the values it changes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::AnalysisConfig;
use crate::extraction::ExtractionConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extraction: ExtractionConfig,
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    /// Loads the config file at `path`.
    ///
    /// A missing file falls back to defaults. A file that exists but cannot
    /// be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        crate::log(&format!("Looking for config at: {}", path.display()));

        if !path.exists() {
            crate::log("Config file not found. Using defaults.");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        crate::log(&format!("Config loaded from {}", path.display()));
        Ok(config)
    }

    /// Writes the default configuration, pretty-printed.
    pub fn save_default(path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, json).with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("config.json")).unwrap();

        assert_eq!(config.extraction.correction_threshold, 60);
        assert_eq!(config.analysis.min_occurrences, 5);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "extraction": { "vocabulary": ["Tofu", "Egg"], "frames": { "stride": 500 } },
                "analysis": { "min_occurrences": 2 }
            }"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();

        assert_eq!(config.extraction.vocabulary, vec!["Tofu", "Egg"]);
        assert_eq!(config.extraction.frames.stride, 500);
        assert_eq!(config.extraction.frames.start, 2000);
        assert_eq!(config.extraction.regions.player_1_name.x, 291);
        assert_eq!(config.analysis.min_occurrences, 2);
        assert_eq!(config.analysis.min_name_length, 2);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_save_default_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        AppConfig::save_default(&path).unwrap();
        let config = AppConfig::load(&path).unwrap();

        assert_eq!(config.extraction.file_template, "frame_{frame}.jpg");
        assert_eq!(config.extraction.tesseract.psm, 8);
        assert!(config.extraction.validate().is_ok());
    }
}
