use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::path::{DEFAULT_MAX_PATH_LENGTH, PathStyle};

/// Top-level configuration for the photo-exif library.
///
/// Tunes path validation and output behavior. Every section has defaults, so
/// a partial file only needs the keys it changes.
///
/// # Loading
///
/// ```rust,no_run
/// use photo_exif::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.validation.max_path_length = 1024;
/// config.validation.extra_denylist.push("/private/".into());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path validation rules.
    pub validation: ValidationConfig,
    /// Output behavior.
    pub output: OutputConfig,
}

/// Knobs for the path validator and normalizer.
///
/// # Example
///
/// ```rust
/// use photo_exif::config::{PathStyleSetting, ValidationConfig};
///
/// let validation = ValidationConfig {
///     max_path_length: 4096,
///     extra_denylist: vec!["/mnt/secrets/".into()],
///     path_style: PathStyleSetting::Posix,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Paths longer than this many characters are refused.
    pub max_path_length: usize,
    /// Case-insensitive substrings refused in addition to the built-in
    /// system directories, for every locator scheme.
    pub extra_denylist: Vec<String>,
    /// How `file://` URLs are turned into local paths.
    pub path_style: PathStyleSetting,
}

/// Path convention for `file://` URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStyleSetting {
    /// Follow the platform the binary runs on.
    #[default]
    Auto,
    Posix,
    DriveLetter,
}

impl PathStyleSetting {
    pub fn resolve(self) -> PathStyle {
        match self {
            Self::Auto => PathStyle::native(),
            Self::Posix => PathStyle::Posix,
            Self::DriveLetter => PathStyle::DriveLetter,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, the CLI prints JSON instead of tables.
    pub json: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            extra_denylist: Vec::new(),
            path_style: PathStyleSetting::Auto,
        }
    }
}

impl Config {
    /// Resolve the config file path, next to the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}
