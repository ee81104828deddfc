use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

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

/// Credentials section of the config file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Bearer token returned by `ink auth login`
    pub token: Option<String>,
}

impl AuthConfig {
    pub fn is_logged_in(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Base URL of the inkdraft API server
    pub api_url: ConfigValue<String>,
    /// Quiet window before an edit is auto-saved, in milliseconds
    pub autosave_ms: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    #[serde(skip_serializing)]
    pub auth: AuthConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    api_url: Option<String>,
    autosave_ms: Option<u64>,
    auth: Option<AuthConfig>,
}

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_AUTOSAVE_MS: u64 = 2000;

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |name| std::env::var(name).ok())
    }

    fn load_with(
        config_path: Option<PathBuf>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut api_url = ConfigValue::new(DEFAULT_API_URL.to_string(), ConfigSource::Default);
        let mut autosave_ms = ConfigValue::new(DEFAULT_AUTOSAVE_MS, ConfigSource::Default);
        let mut config_file = None;
        let mut auth = AuthConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.api_url {
                api_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(ms) = file_config.autosave_ms {
                autosave_ms = ConfigValue::new(ms, ConfigSource::File);
            }
            if let Some(auth_config) = file_config.auth {
                auth = auth_config;
            }
        }

        if let Some(url) = var("INK_API_URL") {
            api_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Some(ms) = var("INK_AUTOSAVE_MS") {
            let parsed = ms
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue("INK_AUTOSAVE_MS", ms.clone()))?;
            autosave_ms = ConfigValue::new(parsed, ConfigSource::Environment);
        }
        if let Some(token) = var("INK_TOKEN") {
            auth.token = Some(token);
        }

        Ok(Self {
            api_url,
            autosave_ms,
            config_file,
            auth,
        })
    }

    /// Path commands write to: the loaded file, or the default location.
    pub fn target_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(Self::default_config_path)
    }

    pub fn quiet_window(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.autosave_ms.value)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/inkdraft/
    /// - macOS: ~/Library/Application Support/inkdraft/
    /// - Windows: %APPDATA%/inkdraft/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("inkdraft")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

/// Sets (or with `None`, removes) `auth.token` in the YAML file at `path`,
/// leaving every other key as it was.
pub fn write_token(path: &Path, token: Option<&str>) -> Result<(), ConfigError> {
    let mut doc: serde_yaml::Value = if path.exists() {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(path.into(), e))?;
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::ParseError(path.into(), e))?
    } else {
        serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
    };
    if doc.is_null() {
        doc = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
    }

    let mapping = doc
        .as_mapping_mut()
        .ok_or_else(|| ConfigError::InvalidFormat(path.to_path_buf()))?;
    let auth_key = serde_yaml::Value::String("auth".to_string());
    let token_key = serde_yaml::Value::String("token".to_string());

    match token {
        Some(token) => {
            let auth = mapping
                .entry(auth_key)
                .or_insert_with(|| serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
            let auth = auth
                .as_mapping_mut()
                .ok_or_else(|| ConfigError::InvalidFormat(path.to_path_buf()))?;
            auth.insert(token_key, serde_yaml::Value::String(token.to_string()));
        }
        None => {
            if let Some(auth) = mapping.get_mut(&auth_key).and_then(|a| a.as_mapping_mut()) {
                auth.remove(&token_key);
            }
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(path.into(), e))?;
    }
    let yaml = serde_yaml::to_string(&doc).map_err(|e| ConfigError::ParseError(path.into(), e))?;
    std::fs::write(path, yaml).map_err(|e| ConfigError::WriteError(path.into(), e))?;
    Ok(())
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    WriteError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidFormat(PathBuf),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::WriteError(path, e) => {
                write!(f, "Failed to write config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidFormat(path) => {
                write!(f, "Config file '{}' is not a YAML mapping", path.display())
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
