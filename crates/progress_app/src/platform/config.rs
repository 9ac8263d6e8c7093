use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use progress_core::{IndicatorConfig, ProgressState};
use progress_engine::{EngineSettings, PushSettings, RpcSettings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::logging::{LogDestination, DEFAULT_LOG_FILE};

pub(crate) const CONFIG_FILENAME: &str = "progress_indicator.ron";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub base_url: String,
    pub session_id: Option<String>,
    pub channel: String,
    pub debounce_ms: u64,
    /// Fallback refresh cadence; `None` relies on push messages alone.
    pub fallback_poll_secs: Option<u64>,
    /// Push states re-published for per-job progress consumers.
    pub forward_states: Vec<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub poll_timeout_secs: u64,
    pub poll_retry_ms: u64,
    pub user_context: BTreeMap<String, Value>,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8069".to_string(),
            session_id: None,
            channel: progress_core::DEFAULT_CHANNEL.to_string(),
            debounce_ms: 10_000,
            fallback_poll_secs: Some(60),
            forward_states: vec!["ongoing".to_string(), "done".to_string()],
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            poll_timeout_secs: 60,
            poll_retry_ms: 5_000,
            user_context: BTreeMap::new(),
            log_destination: LogDestination::File,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub(crate) fn indicator(&self) -> IndicatorConfig {
        IndicatorConfig {
            channel: self.channel.clone(),
            debounce_window: Duration::from_millis(self.debounce_ms),
            forward_states: self
                .forward_states
                .iter()
                .map(|state| ProgressState::from_wire(state.trim()))
                .collect(),
        }
    }

    pub(crate) fn rpc(&self) -> RpcSettings {
        RpcSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            session_id: self.session_id.clone(),
            user_context: self
                .user_context
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Map<String, Value>>(),
        }
    }

    pub(crate) fn push(&self) -> PushSettings {
        PushSettings {
            base_url: self.base_url.clone(),
            channels: vec![self.channel.clone()],
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            poll_timeout: Duration::from_secs(self.poll_timeout_secs),
            session_id: self.session_id.clone(),
        }
    }

    pub(crate) fn engine(&self) -> EngineSettings {
        EngineSettings {
            fallback_poll_interval: self
                .fallback_poll_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            poll_retry_delay: Duration::from_millis(self.poll_retry_ms),
        }
    }

    pub(crate) fn level(&self) -> LevelFilter {
        progress_logging::parse_level(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}

pub(crate) fn parse_config(text: &str) -> Result<AppConfig, ConfigError> {
    ron::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))
}

/// Loads the configuration file. A missing file yields the defaults.
pub(crate) fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Read {
            path: path.display().to_string(),
            source,
        }),
    }
}
