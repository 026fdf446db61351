//! Configuration loading and typed config structures for the scoreboard.
//!
//! Configuration may live in an optional `scoreboard-config.yaml`. Every
//! field has a default, so the file can be absent or partial. Environment
//! variables (typically from a `.env` file loaded by the binary) override
//! YAML values:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `HOST` | `server.host` |
//! | `PORT` | `server.port` |
//! | `ADMIN_PASS` | `admin.password` |
//! | `SESSION_SECRET` | `admin.session_secret` |
//! | `STATE_FILE` | `storage.state_file` |
//! | `PUBLIC_DIR` | `web.public_dir` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Smallest accepted timer interval.
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Session secret used when none is configured. Startup warns about it.
pub const DEFAULT_SESSION_SECRET: &str = "default_secret";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value was present but unusable.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Environment variable or YAML path of the offending value.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level scoreboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScoreboardConfig {
    /// Listening address.
    #[serde(default)]
    pub server: HttpConfig,

    /// Admin gate settings.
    #[serde(default)]
    pub admin: AdminConfig,

    /// State file location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Timer settings.
    #[serde(default)]
    pub timer: TimerConfig,

    /// Static asset settings.
    #[serde(default)]
    pub web: WebConfig,
}

impl ScoreboardConfig {
    /// Load configuration from a YAML file at the given path, then apply
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override or value is unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise start from defaults. In
    /// both cases environment overrides are applied.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `PORT` is not a valid port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in
    /// production, a map in tests). Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `PORT` is not a valid port.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = port.trim().parse().map_err(|e| ConfigError::Invalid {
                key: String::from("PORT"),
                reason: format!("{e}"),
            })?;
        }
        if let Some(password) = get("ADMIN_PASS") {
            self.admin.password = Some(password);
        }
        if let Some(secret) = get("SESSION_SECRET") {
            self.admin.session_secret = secret;
        }
        if let Some(path) = get("STATE_FILE") {
            self.storage.state_file = PathBuf::from(path);
        }
        if let Some(dir) = get("PUBLIC_DIR") {
            self.web.public_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a timer interval below
    /// [`MIN_TICK_INTERVAL_MS`] or a zero session TTL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timer.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                key: String::from("timer.tick_interval_ms"),
                reason: format!("must be at least {MIN_TICK_INTERVAL_MS}"),
            });
        }
        if self.admin.session_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                key: String::from("admin.session_ttl_secs"),
                reason: String::from("must be greater than zero"),
            });
        }
        Ok(())
    }
}

/// Listening address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Admin gate settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AdminConfig {
    /// Shared admin password. When unset no login can succeed.
    #[serde(default)]
    pub password: Option<String>,

    /// Key material for signing session cookies.
    #[serde(default = "default_session_secret")]
    pub session_secret: String,

    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl AdminConfig {
    /// Session lifetime as a [`Duration`].
    pub const fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Whether the built-in session secret is still in use.
    pub fn uses_default_secret(&self) -> bool {
        self.session_secret == DEFAULT_SESSION_SECRET
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: None,
            session_secret: default_session_secret(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl core::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("session_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}

/// State file location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON state file.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

/// Timer settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimerConfig {
    /// Real-time milliseconds per tick. Each tick adds one second.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl TimerConfig {
    /// Tick interval as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Static asset settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebConfig {
    /// Directory served for paths without a dedicated route.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            public_dir: default_public_dir(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    3000
}

fn default_session_secret() -> String {
    String::from(DEFAULT_SESSION_SECRET)
}

const fn default_session_ttl_secs() -> u64 {
    21_600
}

fn default_state_file() -> PathBuf {
    PathBuf::from("./state.json")
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}
