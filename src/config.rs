use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::upload::{default_image_types, MIB};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub gallery: GalleryConfig,

    #[serde(default)]
    pub profile: ProfileConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one file per stored key
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// Cap on total stored bytes, like a browser's local storage quota
    #[serde(default)]
    pub quota_bytes: Option<u64>,
}

fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("folio/storage")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            quota_bytes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    #[serde(default = "default_image_types")]
    pub accepted_types: Vec<String>,

    #[serde(default = "default_gallery_max_bytes")]
    pub max_file_bytes: u64,

    #[serde(default = "default_progress_hide_delay_ms")]
    pub progress_hide_delay_ms: u64,

    #[serde(default = "default_download_filename")]
    pub download_filename: String,

    /// Category given to new uploads
    #[serde(default = "default_category")]
    pub default_category: String,
}

fn default_gallery_max_bytes() -> u64 {
    5 * MIB
}

fn default_progress_hide_delay_ms() -> u64 {
    1000
}

fn default_download_filename() -> String {
    "portfolio-photo.jpg".to_string()
}

fn default_category() -> String {
    "personal".to_string()
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            accepted_types: default_image_types(),
            max_file_bytes: default_gallery_max_bytes(),
            progress_hide_delay_ms: default_progress_hide_delay_ms(),
            download_filename: default_download_filename(),
            default_category: default_category(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_image_types")]
    pub accepted_types: Vec<String>,

    #[serde(default = "default_profile_max_bytes")]
    pub max_file_bytes: u64,
}

fn default_profile_max_bytes() -> u64 {
    2 * MIB
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            accepted_types: default_image_types(),
            max_file_bytes: default_profile_max_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,
}

fn default_toast_duration_ms() -> u64 {
    3000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            toast_duration_ms: default_toast_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `FOLIO_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Send events to the systemd journal when it is reachable
    #[serde(default = "default_journald")]
    pub journald: bool,

    /// Directory for the daily log file used when the journal is not
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_journald() -> bool {
    true
}

fn default_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("folio/logs")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            journald: default_journald(),
            directory: default_log_directory(),
        }
    }
}

impl Config {
    /// Load from `FOLIO_CONFIG` if set, otherwise from the default location,
    /// writing a default config there on first run.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("FOLIO_CONFIG") {
            return Self::load_from(Path::new(&path));
        }

        let config_path = Self::config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("folio")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[gallery]
max_file_bytes = 1048576
download_filename = "me.jpg"

[storage]
path = "/tmp/folio-test"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.gallery.max_file_bytes, MIB);
        assert_eq!(config.gallery.download_filename, "me.jpg");
        assert_eq!(config.gallery.progress_hide_delay_ms, 1000);
        assert_eq!(config.gallery.accepted_types.len(), 4);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/folio-test"));
        assert_eq!(config.storage.quota_bytes, None);
        assert_eq!(config.profile.max_file_bytes, 2 * MIB);
        assert_eq!(config.notifications.toast_duration_ms, 3000);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.journald);
    }

    #[test]
    fn test_logging_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[logging]\nlevel = \"folio=debug\"\njournald = false\ndirectory = \"/var/tmp/folio\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.logging.level, "folio=debug");
        assert!(!config.logging.journald);
        assert_eq!(config.logging.directory, PathBuf::from("/var/tmp/folio"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.storage.quota_bytes = Some(5 * MIB);
        config.gallery.default_category = "travel".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage.quota_bytes, Some(5 * MIB));
        assert_eq!(loaded.gallery.default_category, "travel");
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gallery]\nmax_file_bytes = \"lots\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
