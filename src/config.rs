use crate::error::{ConfigError, Result};
use crate::extract::SelectorPolicy;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_filename")]
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default = "default_chrome_impersonation")]
    pub chrome_impersonation: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub selector_policy: SelectorPolicy,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

// Default implementations
impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
            filename: default_log_filename(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            proxy: None,
            chrome_impersonation: default_chrome_impersonation(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::FileRead)?;
        let config = Self::from_toml(&content)?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Like `from_file`, but a missing file yields the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            info!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(ConfigError::MissingField("server.host".to_string()).into());
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue(
                "server.port must be greater than 0".to_string(),
            )
            .into());
        }

        if self.fetch.user_agent.is_empty() {
            return Err(ConfigError::MissingField("fetch.user_agent".to_string()).into());
        }

        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "fetch.timeout_secs must be greater than 0".to_string(),
            )
            .into());
        }

        if self.fetch.retry_delay_secs == 0 && self.fetch.max_retries > 0 {
            return Err(ConfigError::InvalidValue(
                "fetch.retry_delay_secs must be greater than 0 when retries are enabled"
                    .to_string(),
            )
            .into());
        }

        if let Some(proxy) = &self.fetch.proxy {
            if url::Url::parse(proxy).is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "fetch.proxy is not a valid URL: {}",
                    proxy
                ))
                .into());
            }
        }

        if self.logging.directory.is_empty() {
            return Err(
                ConfigError::InvalidValue("logging.directory cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    40
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_chrome_impersonation() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "logs".to_string()
}

fn default_log_filename() -> String {
    "schema-crawler.log".to_string()
}
