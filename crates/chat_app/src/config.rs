//! Runtime configuration, taken from defaults overridden by environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chat_engine::GenerateSettings;
use chat_logging::LogDestination;
use log::LevelFilter;

pub const ENV_SERVER_URL: &str = "CHAT_SERVER_URL";
pub const ENV_STATE_DIR: &str = "CHAT_STATE_DIR";
pub const ENV_LOG: &str = "CHAT_LOG";
pub const ENV_LOG_LEVEL: &str = "CHAT_LOG_LEVEL";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "CHAT_CONNECT_TIMEOUT_SECS";

const LOG_FILENAME: &str = "chat.log";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub generate: GenerateSettings,
    pub state_dir: PathBuf,
    pub log_destination: LogDestination,
    pub log_level: LevelFilter,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generate: GenerateSettings::default(),
            state_dir: PathBuf::from("."),
            log_destination: LogDestination::File(PathBuf::from(LOG_FILENAME)),
            log_level: LevelFilter::Info,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = value(ENV_SERVER_URL) {
            config.generate.base_url = url.trim().to_string();
        }
        if let Some(secs) = value(ENV_CONNECT_TIMEOUT_SECS).and_then(|v| v.trim().parse().ok()) {
            config.generate.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = value(ENV_STATE_DIR) {
            config.state_dir = PathBuf::from(dir);
        }
        let log_path = config.state_dir.join(LOG_FILENAME);
        config.log_destination = value(ENV_LOG)
            .and_then(|raw| LogDestination::parse(&raw, &log_path))
            .unwrap_or(LogDestination::File(log_path));
        if let Some(level) = value(ENV_LOG_LEVEL).and_then(|v| LevelFilter::from_str(v.trim()).ok())
        {
            config.log_level = level;
        }
        config
    }
}
