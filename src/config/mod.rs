//! User configuration loaded from YAML.
//!
//! Default location: `<config_dir>/auralux/config.yaml`. A missing file yields
//! defaults; an unreadable or invalid one is logged and replaced by defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::audio::AnalyzerConfig;
use crate::render::StyleKind;

const APP_DIR: &str = "auralux";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analyzer: AnalyzerConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Style key shown at startup.
    pub default_style: String,
    pub target_fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_style: StyleKind::Abstract.key().to_string(),
            target_fps: 30,
        }
    }
}

impl DisplayConfig {
    /// Startup style, falling back to the first style for unknown keys.
    pub fn style(&self) -> StyleKind {
        StyleKind::from_key(&self.default_style).unwrap_or(StyleKind::ALL[0])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Log file used while the terminal UI owns the screen.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn file_path(&self) -> PathBuf {
        self.file.clone().unwrap_or_else(default_log_path)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.yaml")
}

pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("auralux.log")
}

/// Load the configuration at `path`, never failing.
pub fn load_config(path: &Path) -> AppConfig {
    log::info!("load_config: loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: no config file, using defaults");
        return AppConfig::default();
    }

    let mut config = match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<AppConfig>(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("load_config: failed to parse config: {}, using defaults", e);
                return AppConfig::default();
            }
        },
        Err(e) => {
            log::warn!("load_config: failed to read config file: {}, using defaults", e);
            return AppConfig::default();
        }
    };

    if let Err(reason) = config.analyzer.validate() {
        log::warn!("load_config: {}, using default analyzer settings", reason);
        config.analyzer = AnalyzerConfig::default();
    }
    if config.display.target_fps == 0 {
        log::warn!("load_config: target_fps must be positive, using default");
        config.display.target_fps = DisplayConfig::default().target_fps;
    }
    config
}

/// Write `config` to `path`, creating parent directories.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory: {:?}", parent))?;
    }
    let yaml = serde_yaml::to_string(config).context("failed to serialize config to YAML")?;
    std::fs::write(path, yaml).with_context(|| format!("failed to write config file: {:?}", path))?;
    log::info!("save_config: saved to {:?}", path);
    Ok(())
}
