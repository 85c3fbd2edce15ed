//! Configuration management for channels_fetcher
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! config file, environment variables and finally CLI arguments (applied by
//! the command handlers).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::ClientConfig;
use crate::constants::{config as paths, decrypt, download, env, files, http, logging, template};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Download and output settings
    pub download: DownloadConfig,
    /// Keystream generator settings
    pub decrypt: DecryptConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP keep-alive interval (unset = disabled)
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout (unset = no timeout)
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    pub pool_max_per_host: usize,
    /// Whole-request timeout, body included (unset = none)
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_keepalive: Some(Duration::from_secs(30)),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: None,
            connect_timeout: http::CONNECT_TIMEOUT,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

/// Download behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
    /// Directory finished files are written to
    pub output_dir: PathBuf,
    /// Filename template, see `app::filename`
    pub filename_template: String,
    /// Download the original (highest quality) stream instead of the first spec
    pub default_highest: bool,
    /// Replace existing files
    pub overwrite: bool,
    /// Minimum spacing between progress updates
    #[serde(with = "humantime_serde")]
    pub progress_interval: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(files::DEFAULT_OUTPUT_DIR),
            filename_template: template::DEFAULT_TEMPLATE.to_string(),
            default_highest: false,
            overwrite: false,
            progress_interval: download::PROGRESS_INTERVAL,
        }
    }
}

/// Keystream generator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecryptConfig {
    /// External generator program, called as `<cmd> [args..] <seed> <length>`
    pub keystream_cmd: Option<PathBuf>,
    /// Fixed arguments passed before the seed
    pub keystream_args: Vec<String>,
    /// Pre-computed keystream file, used when no command is set
    pub keystream_file: Option<PathBuf>,
    /// Number of keystream bytes requested per asset
    pub keystream_len: usize,
}

impl Default for DecryptConfig {
    fn default() -> Self {
        Self {
            keystream_cmd: None,
            keystream_args: Vec::new(),
            keystream_file: None,
            keystream_len: decrypt::DEFAULT_KEYSTREAM_LEN,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            tcp_keepalive: self.tcp_keepalive,
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout,
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (ClientConfig, DownloadConfig, DecryptConfig) {
        (
            self.client.to_runtime_config(),
            self.download.clone(),
            self.decrypt.clone(),
        )
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an explicitly requested file is missing, a
    /// file cannot be parsed or a value is out of range
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => Self::default(),
        };

        config.apply_overrides_from(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(env::OUTPUT_DIR).filter(|v| !v.trim().is_empty()) {
            debug!("Output directory overridden by {}", env::OUTPUT_DIR);
            self.download.output_dir = PathBuf::from(dir);
        }
        if let Some(cmd) = lookup(env::KEYSTREAM_CMD).filter(|v| !v.trim().is_empty()) {
            debug!("Keystream generator overridden by {}", env::KEYSTREAM_CMD);
            self.decrypt.keystream_cmd = Some(PathBuf::from(cmd));
        }
    }

    /// Check values that would only fail later at runtime
    pub fn validate(&self) -> ConfigResult<()> {
        if self.decrypt.keystream_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "decrypt.keystream_len".to_string(),
                value: "0".to_string(),
                reason: "Keystream length must be positive".to_string(),
            });
        }
        if self.download.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "download.output_dir".to_string(),
                value: String::new(),
                reason: "Output directory must not be empty".to_string(),
            });
        }
        if self.client.pool_max_per_host == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.pool_max_per_host".to_string(),
                value: "0".to_string(),
                reason: "At least one connection per host is required".to_string(),
            });
        }
        Ok(())
    }

    /// Write a commented default config file
    ///
    /// Uses the user config location when `path` is not given.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists and `force` is false, or if
    /// it cannot be written
    pub async fn write_default(path: Option<PathBuf>, force: bool) -> ConfigResult<PathBuf> {
        let config_path = match path {
            Some(path) => path,
            None => Self::get_default_config_path()?,
        };

        if config_path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "path".to_string(),
                value: config_path.display().to_string(),
                reason: "Configuration file already exists. Use --force to overwrite".to_string(),
            });
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ConfigError::InvalidValue {
                        field: "path".to_string(),
                        value: parent.display().to_string(),
                        reason: e.to_string(),
                    }
                })?;
            }
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| ConfigError::InvalidValue {
                field: "path".to_string(),
                value: config_path.display().to_string(),
                reason: e.to_string(),
            })?;

        info!("Wrote default configuration to {}", config_path.display());
        Ok(config_path)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(paths::LOCAL_CONFIG_FILE)];
        if let Ok(user_config) = Self::get_default_config_path() {
            search_paths.push(user_config);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir
            .join(paths::CONFIG_DIR_NAME)
            .join(paths::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.to_path_buf(),
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# channels_fetcher configuration
# Durations accept human readable values such as "200ms", "30s" or "30m".

[client]
tcp_keepalive = "30s"
tcp_nodelay = true
pool_idle_timeout = "90s"
pool_max_per_host = {pool}
# Caps the whole transfer, body included. Unset: a slow stream runs until it ends
# request_timeout = "2h"
connect_timeout = "30s"
user_agent = "{agent}"

[download]
output_dir = "{output}"
# Placeholders: {{{{id}}}} {{{{title}}}} {{{{nickname}}}} {{{{spec}}}}
filename_template = "{template}"
default_highest = false  # true = original stream instead of the first spec
overwrite = false
progress_interval = "200ms"

[decrypt]
# External keystream generator, called as <cmd> [args..] <seed> <length>
# keystream_cmd = "/usr/local/bin/keystream-gen"
keystream_args = []
# keystream_file = "/path/to/keystream.bin"
keystream_len = {len}

[logging]
level = "warn"  # error, warn, info, debug, trace
"#,
            pool = http::POOL_MAX_PER_HOST,
            agent = http::USER_AGENT,
            output = files::DEFAULT_OUTPUT_DIR,
            template = template::DEFAULT_TEMPLATE,
            len = decrypt::DEFAULT_KEYSTREAM_LEN,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();
        assert_eq!(config.download.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.download.progress_interval, Duration::from_millis(200));
        assert_eq!(config.decrypt.keystream_len, 131_072);
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_generation() {
        let content = AppConfig::generate_default_config_content();

        // Should be valid TOML matching the defaults
        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, AppConfig::default());
        assert!(content.contains("[download]"));
        assert!(content.contains("{{title}}"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
[download]
output_dir = "/srv/videos"
progress_interval = "1s"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(parsed.download.output_dir, PathBuf::from("/srv/videos"));
        assert_eq!(parsed.download.progress_interval, Duration::from_secs(1));
        assert_eq!(parsed.download.filename_template, "{{title}}");
        assert_eq!(parsed.client, ClientConfigToml::default());
    }

    #[test]
    fn test_request_timeout_is_opt_in() {
        assert_eq!(AppConfig::default().client.request_timeout, None);
        assert_eq!(AppConfig::default().to_runtime_config().0.request_timeout, None);

        let parsed: AppConfig = toml::from_str(
            r#"
[client]
request_timeout = "2h"
"#,
        )
        .unwrap();
        assert_eq!(
            parsed.client.to_runtime_config().request_timeout,
            Some(Duration::from_secs(2 * 60 * 60))
        );
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = AppConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (env::OUTPUT_DIR, "/tmp/out"),
            (env::KEYSTREAM_CMD, "/opt/keystream"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides_from(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.download.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(
            config.decrypt.keystream_cmd,
            Some(PathBuf::from("/opt/keystream"))
        );
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides_from(|_| Some("  ".to_string()));
        assert_eq!(config.download.output_dir, PathBuf::from("downloads"));
        assert!(config.decrypt.keystream_cmd.is_none());
    }

    #[test]
    fn test_validation_rejects_zero_keystream() {
        let mut config = AppConfig::default();
        config.decrypt.keystream_len = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_write_default_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let written = AppConfig::write_default(Some(config_path.clone()), false)
            .await
            .unwrap();
        assert_eq!(written, config_path);

        // Refuses to clobber without force
        assert!(AppConfig::write_default(Some(config_path.clone()), false)
            .await
            .is_err());
        assert!(AppConfig::write_default(Some(config_path.clone()), true)
            .await
            .is_ok());

        let loaded = AppConfig::load_from_file(&config_path).await.unwrap();
        assert_eq!(loaded, AppConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_toml_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        tokio::fs::write(&config_path, "[download\noutput_dir = 1")
            .await
            .unwrap();

        assert!(matches!(
            AppConfig::load_from_file(&config_path).await,
            Err(ConfigError::InvalidFormat(_))
        ));
    }
}
