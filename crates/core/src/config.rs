//! Configuration management for catbox

use crate::error::{Error, Result};
use dirs::home_dir;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration directory name
const CONFIG_DIR: &str = "catbox";

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Main upload and album endpoint
pub const DEFAULT_API_URL: &str = "https://catbox.moe/user/api.php";

/// Temporary-storage endpoint
pub const DEFAULT_LITTERBOX_URL: &str = "https://litterbox.catbox.moe/resources/internals/api.php";

/// Host serving uploaded files
pub const DEFAULT_FILE_URL: &str = "https://files.catbox.moe";

/// Prefix of album URLs
pub const DEFAULT_ALBUM_URL: &str = "https://catbox.moe/c";

/// Settings of one client. Immutable once the client is built.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Account credential; uploads are anonymous without it
    pub userhash: Option<String>,
    pub api_url: String,
    pub litterbox_url: String,
    pub file_url: String,
    pub album_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            userhash: None,
            api_url: DEFAULT_API_URL.to_string(),
            litterbox_url: DEFAULT_LITTERBOX_URL.to_string(),
            file_url: DEFAULT_FILE_URL.to_string(),
            album_url: DEFAULT_ALBUM_URL.to_string(),
            timeout: Duration::from_secs(default_timeout()),
        }
    }
}

// Keep the userhash out of logs and panics.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("userhash", &self.userhash.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("litterbox_url", &self.litterbox_url)
            .field("file_url", &self.file_url)
            .field("album_url", &self.album_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Anonymous configuration against the public service
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the account userhash. Blank values mean anonymous.
    pub fn with_userhash(mut self, userhash: impl Into<String>) -> Self {
        let userhash = userhash.into();
        self.userhash = if userhash.trim().is_empty() {
            None
        } else {
            Some(userhash.trim().to_string())
        };
        self
    }

    /// Point the main endpoint elsewhere (self-hosted mirrors, tests)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_litterbox_url(mut self, litterbox_url: impl Into<String>) -> Self {
        self.litterbox_url = litterbox_url.into();
        self
    }

    pub fn with_file_url(mut self, file_url: impl Into<String>) -> Self {
        self.file_url = file_url.into();
        self
    }

    pub fn with_album_url(mut self, album_url: impl Into<String>) -> Self {
        self.album_url = album_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a client configuration from the on-disk config file
    pub fn from_file(file: &ConfigFile) -> Self {
        let mut config = ClientConfig::new()
            .with_api_url(file.catbox.api_url.clone())
            .with_litterbox_url(file.catbox.litterbox_url.clone())
            .with_file_url(file.catbox.file_url.clone())
            .with_album_url(file.catbox.album_url.clone());

        if let Some(userhash) = &file.catbox.userhash {
            config = config.with_userhash(userhash.clone());
        }
        if let Some(advanced) = &file.advanced {
            config = config.with_timeout(Duration::from_secs(advanced.timeout));
        }

        config
    }

    /// Check that every endpoint is an http(s) URL and the timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api_url", &self.api_url),
            ("litterbox_url", &self.litterbox_url),
            ("file_url", &self.file_url),
            ("album_url", &self.album_url),
        ] {
            let url = Url::parse(value)
                .map_err(|e| Error::InvalidConfig(format!("{} '{}': {}", name, value, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::InvalidConfig(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, value
                )));
            }
        }

        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be greater than zero".to_string()));
        }

        Ok(())
    }
}

/// On-disk configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub catbox: CatboxConfig,
    pub advanced: Option<AdvancedConfig>,
    pub logging: Option<LoggingConfig>,
}

/// Service endpoints and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatboxConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userhash: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_litterbox_url")]
    pub litterbox_url: String,
    #[serde(default = "default_file_url")]
    pub file_url: String,
    #[serde(default = "default_album_url")]
    pub album_url: String,
}

impl Default for CatboxConfig {
    fn default() -> Self {
        Self {
            userhash: None,
            api_url: default_api_url(),
            litterbox_url: default_litterbox_url(),
            file_url: default_file_url(),
            album_url: default_album_url(),
        }
    }
}

/// Advanced configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_litterbox_url() -> String {
    DEFAULT_LITTERBOX_URL.to_string()
}

fn default_file_url() -> String {
    DEFAULT_FILE_URL.to_string()
}

fn default_album_url() -> String {
    DEFAULT_ALBUM_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let home = home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR))
}

/// Get the configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Load configuration from the default location
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&get_config_path()?)
}

/// Load configuration from a specific file
pub fn load_config_from(config_path: &std::path::Path) -> Result<ConfigFile> {
    if !config_path.exists() {
        return Err(Error::ConfigNotFound(config_path.to_path_buf()));
    }

    let content = fs::read_to_string(config_path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config file: {}", e))
    })?;

    let config: ConfigFile = toml::from_str(&content)?;

    Ok(config)
}

/// Save configuration to the default location
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let config_path = get_config_path()?;
    save_config_to(config, &config_path)?;
    Ok(config_path)
}

/// Save configuration to a specific file, readable by the owner only
pub fn save_config_to(config: &ConfigFile, config_path: &std::path::Path) -> Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    let content = toml::to_string_pretty(config)?;

    fs::write(config_path, content).map_err(|e| {
        Error::Config(format!("Failed to write config file: {}", e))
    })?;

    // The file holds the userhash
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(config_path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(config_path, perms)?;
    }

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(userhash) = &config.catbox.userhash {
        if userhash.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "userhash is set but empty (remove it for anonymous uploads)".to_string(),
            ));
        }
        if userhash.chars().any(char::is_whitespace) {
            return Err(Error::InvalidConfig("userhash cannot contain whitespace".to_string()));
        }
    }

    if let Some(advanced) = &config.advanced {
        if advanced.timeout > 3600 {
            return Err(Error::InvalidConfig(
                "timeout cannot exceed 1 hour (3600 seconds)".to_string(),
            ));
        }
    }

    ClientConfig::from_file(config).validate()
}

/// Check if configuration exists
pub fn config_exists() -> bool {
    get_config_path().map(|p| p.exists()).unwrap_or(false)
}
