use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use grocer_core::EngineOptions;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote server settings used by `grocer remote`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerSection {
    /// Base URL of a grocer server (e.g. "http://localhost:8080")
    pub url: Option<String>,
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the catalog and list documents
    pub data_dir: ConfigValue<PathBuf>,
    /// Category every new store starts with
    pub default_category: ConfigValue<String>,
    /// Name of the list created when none is active
    pub default_list_name: ConfigValue<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub server: ServerSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    default_category: Option<String>,
    default_list_name: Option<String>,
    server: Option<ServerSection>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let defaults = EngineOptions::default();
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut default_category =
            ConfigValue::new(defaults.default_category, ConfigSource::Default);
        let mut default_list_name =
            ConfigValue::new(defaults.default_list_name, ConfigSource::Default);
        let mut config_file = None;
        let mut server = ServerSection::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Relative to the config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(name) = file_config.default_category {
                default_category = ConfigValue::new(name, ConfigSource::File);
            }
            if let Some(name) = file_config.default_list_name {
                default_list_name = ConfigValue::new(name, ConfigSource::File);
            }
            if let Some(section) = file_config.server {
                server = section;
            }
        }

        if let Ok(dir) = std::env::var("GROCER_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(name) = std::env::var("GROCER_DEFAULT_CATEGORY") {
            default_category = ConfigValue::new(name, ConfigSource::Environment);
        }
        if let Ok(name) = std::env::var("GROCER_DEFAULT_LIST") {
            default_list_name = ConfigValue::new(name, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("GROCER_SERVER_URL") {
            server.url = Some(url);
        }

        Ok(Self {
            data_dir,
            default_category,
            default_list_name,
            config_file,
            server,
        })
    }

    /// Engine settings derived from this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            default_category: self.default_category.value.clone(),
            default_list_name: self.default_list_name.value.clone(),
            seed_catalog: true,
        }
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/grocer/
    /// - macOS: ~/Library/Application Support/grocer/
    /// - Windows: %APPDATA%/grocer/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("grocer")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/grocer/
    /// - macOS: ~/Library/Application Support/grocer/
    /// - Windows: %APPDATA%/grocer/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("grocer")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
