//! Configuration file parser for ~/.config/sheetfeed/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`,
//! which points at the built-in alert spreadsheets. Unknown keys are accepted
//! but logged as a warning since they are usually typos.
use crate::feed::{SheetsClient, SortMode, SourceKey};
use crate::refresh::Schedule;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// Parsed fine but describes nothing that can be displayed.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// One sheet (tab) of a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SheetConfig {
    pub name: String,
    pub sheet_id: String,
}

/// A published spreadsheet and the sheets offered from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpreadsheetConfig {
    pub name: String,
    pub spreadsheet_id: String,
    pub sheets: Vec<SheetConfig>,
}

impl SpreadsheetConfig {
    pub fn source_key(&self, sheet: &SheetConfig) -> SourceKey {
        SourceKey::new(&self.spreadsheet_id, &sheet.sheet_id)
    }
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Heading shown above the dashboard.
    pub title: String,

    /// Whether background refresh starts enabled.
    pub auto_refresh: bool,

    /// Background refresh interval in seconds. 0 = manual refresh only.
    pub refresh_interval_seconds: u64,

    /// Initial sort order.
    pub default_sort: SortMode,

    /// Base URL of the spreadsheet export service.
    pub export_base_url: String,

    /// Per-request timeout in seconds, body included.
    pub request_timeout_seconds: u64,

    /// Keep showing the last good records while a fetch error is displayed.
    pub keep_items_on_error: bool,

    /// Data sources offered by the dashboard, in display order.
    pub spreadsheets: Vec<SpreadsheetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Prototype Archive".to_string(),
            auto_refresh: true,
            refresh_interval_seconds: 60,
            default_sort: SortMode::Newest,
            export_base_url: SheetsClient::DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: 30,
            keep_items_on_error: true,
            spreadsheets: default_spreadsheets(),
        }
    }
}

fn default_spreadsheets() -> Vec<SpreadsheetConfig> {
    const MAIN_ID: &str = "1vSF7UAPWRsTMfExdZaDM9MBqUd_lq6TqbYYzNPKo_Rk";
    let sheet = |name: &str, sheet_id: &str| SheetConfig {
        name: name.to_string(),
        sheet_id: sheet_id.to_string(),
    };

    vec![
        SpreadsheetConfig {
            name: "Main Spreadsheet".to_string(),
            spreadsheet_id: MAIN_ID.to_string(),
            sheets: vec![
                sheet("Biomedical Alerts", "1175542757"),
                sheet("Medical Innovation Alerts", "704807287"),
                sheet("Medical Technology Alerts", "769016024"),
            ],
        },
        SpreadsheetConfig {
            name: "Secondary Spreadsheet".to_string(),
            spreadsheet_id: MAIN_ID.to_string(),
            sheets: vec![sheet("Main Sheet", "0")],
        },
    ]
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: &'static [&'static str] = &[
        "title",
        "auto_refresh",
        "refresh_interval_seconds",
        "default_sort",
        "export_base_url",
        "request_timeout_seconds",
        "keep_items_on_error",
        "spreadsheets",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - No spreadsheets, or a spreadsheet without sheets → `Err(ConfigError::Invalid)`
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            spreadsheets = config.spreadsheets.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.spreadsheets.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[spreadsheets]] entry is required".to_string(),
            ));
        }
        if let Some(empty) = self.spreadsheets.iter().find(|s| s.sheets.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "spreadsheet '{}' has no sheets",
                empty.name
            )));
        }
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The auto-refresh schedule this config starts with.
    pub fn schedule(&self) -> Schedule {
        Schedule {
            enabled: self.auto_refresh,
            interval_secs: self.refresh_interval_seconds,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("sheetfeed_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.title, "Prototype Archive");
        assert!(config.auto_refresh);
        assert_eq!(config.refresh_interval_seconds, 60);
        assert_eq!(config.default_sort, SortMode::Newest);
        assert_eq!(config.export_base_url, "https://docs.google.com");
        assert!(config.keep_items_on_error);
        assert_eq!(config.spreadsheets.len(), 2);
        assert_eq!(config.spreadsheets[0].sheets.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/sheetfeed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.refresh_interval_seconds, 60);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let (dir, path) = write_config("empty", "   \n  \n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.spreadsheets.len(), 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let (dir, path) = write_config("partial", "auto_refresh = false\n");
        let config = Config::load(&path).unwrap();
        assert!(!config.auto_refresh);
        assert_eq!(config.refresh_interval_seconds, 60);
        assert_eq!(config.spreadsheets.len(), 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
title = "Device Watch"
auto_refresh = true
refresh_interval_seconds = 300
default_sort = "alphabetical"
export_base_url = "https://sheets.example.com"
request_timeout_seconds = 10
keep_items_on_error = false

[[spreadsheets]]
name = "Devices"
spreadsheet_id = "dev-123"

[[spreadsheets.sheets]]
name = "Recalls"
sheet_id = "11"

[[spreadsheets.sheets]]
name = "Approvals"
sheet_id = "12"
"#;
        let (dir, path) = write_config("full", content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.title, "Device Watch");
        assert_eq!(config.default_sort, SortMode::Alphabetical);
        assert_eq!(config.export_base_url, "https://sheets.example.com");
        assert_eq!(config.request_timeout_seconds, 10);
        assert!(!config.keep_items_on_error);
        assert_eq!(
            config.schedule(),
            Schedule {
                enabled: true,
                interval_secs: 300
            }
        );

        let sheet = &config.spreadsheets[0];
        assert_eq!(sheet.sheets.len(), 2);
        assert_eq!(
            sheet.source_key(&sheet.sheets[1]),
            SourceKey::new("dev-123", "12")
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_sort_mode_rejected() {
        let (dir, path) = write_config("bad_sort", "default_sort = \"random\"\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (dir, path) = write_config("unknown", "auto_refresh = true\nthemes = \"dark\"\n");
        assert!(Config::load(&path).is_ok());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_spreadsheet_without_sheets_rejected() {
        let content = r#"
[[spreadsheets]]
name = "Empty"
spreadsheet_id = "x"
sheets = []
"#;
        let (dir, path) = write_config("no_sheets", content);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("Empty"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_spreadsheet_list_rejected() {
        let (dir, path) = write_config("no_spreadsheets", "spreadsheets = []\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let (dir, path) = write_config("zero_timeout", "request_timeout_seconds = 0\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
