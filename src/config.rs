use serde::Deserialize;

use crate::events::model::LogLevel;
use crate::network::registry::CollisionPolicy;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Local alias announced in the handshake. Prompted for when unset.
    pub alias: Option<String>,
    /// Listening socket address (default `0.0.0.0:0`, an OS-assigned port)
    pub listen_addr: Option<String>,
    /// Peer session behavior
    pub session: Option<SessionConfig>,
    /// Logging / events configuration
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SessionConfig {
    /// What happens when a handshake yields an identity that is already connected
    pub collision: Option<CollisionPolicy>,
    /// Bound of the channel carrying peer messages and lifecycle notices to the prompt
    pub event_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Path to JSON line event log (rotated). If unset, defaults to logs/peerchat.jsonl
    pub json_path: Option<String>,
    /// Max size in bytes before rotation (default 5MB)
    pub json_max_bytes: Option<usize>,
    /// Number of rotated files to retain (default 3)
    pub json_rotate: Option<u32>,
    /// Disable console sink (default false)
    pub disable_console: Option<bool>,
    /// Minimum level printed by the console sink (default warn)
    pub console_level: Option<LogLevel>,
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read and parse a TOML file. `Ok(None)` when the file does not exist.
    pub fn load(path: &str) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(Self::from_toml_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!("failed to read config '{}': {}", path, e)),
        }
    }
}
