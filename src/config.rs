use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::codec::CodecKind;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "off" => Some(LogLevel::Off),
            _ => None,
        }
    }
}

/// Server configuration.
///
/// Every field has a default, so a YAML file only needs the keys it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sent in the `Server` header
    pub server_name: String,
    pub host: String,
    /// `0` picks a free port
    pub port: u16,
    pub log_level: LogLevel,
    /// Log one line per served request
    pub log_requests: bool,
    /// How long a worker waits for request bytes before checking for idleness
    pub read_timeout_ms: u64,
    pub keep_alive_timeout_secs: u64,
    /// Requests served on one connection before it is closed
    pub keep_alive_max: u32,
    /// Largest accepted request head
    pub max_head_bytes: usize,
    /// Largest accepted `Content-Length`
    pub max_body_bytes: usize,
    /// Percent-decode query and form parameters
    pub decode_query: bool,
    pub codec: CodecKind,
    /// Where sessions are loaded from at startup and saved to on shutdown
    pub sessions_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_name: "Restwire : Lightweight REST Server".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: LogLevel::Info,
            log_requests: true,
            read_timeout_ms: 1000,
            keep_alive_timeout_secs: 5,
            keep_alive_max: 99,
            max_head_bytes: 64 * 1024,
            max_body_bytes: 8 * 1024 * 1024,
            decode_query: false,
            codec: CodecKind::Json,
            sessions_file: None,
        }
    }
}

impl Config {
    /// Loads the configuration from the environment.
    ///
    /// `RESTWIRE_CONFIG` names an optional YAML file; `RESTWIRE_HOST`,
    /// `RESTWIRE_PORT` and `RESTWIRE_LOG` override single values on top.
    pub fn load() -> Self {
        let mut cfg = match std::env::var("RESTWIRE_CONFIG") {
            Ok(path) => Self::from_file(&path).unwrap_or_else(|e| {
                eprintln!("ignoring configuration file: {e}");
                Self::default()
            }),
            Err(_) => Self::default(),
        };

        if let Ok(host) = std::env::var("RESTWIRE_HOST") {
            cfg.host = host;
        }
        if let Some(port) = std::env::var("RESTWIRE_PORT").ok().and_then(|p| p.parse().ok()) {
            cfg.port = port;
        }
        if let Some(level) = std::env::var("RESTWIRE_LOG").ok().and_then(|l| LogLevel::parse(&l)) {
            cfg.log_level = level;
        }

        cfg
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn keep_alive_timeout(&self) -> Duration {
        Duration::from_secs(self.keep_alive_timeout_secs)
    }
}
