//! Central place for application-wide constants and default values.

/// Default application name shown in banners and logs.
pub const DEFAULT_APP_NAME: &str = "PeerChat";

/// Left padding used to align log lines with those that include emoji prefixes.
pub const ICON_PLACEHOLDER: &str = "   "; // Three spaces for alignment

/// Literal prefix of the single handshake line each side sends first.
pub const NAME_COMMAND_PREFIX: &str = "/name ";

/// Listening address used when neither CLI nor config provide one (OS-assigned port).
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:0";

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "peerchat.toml";

/// Default JSON-lines event log location.
pub const DEFAULT_JSON_LOG_PATH: &str = "logs/peerchat.jsonl";

/// Bound of the channel carrying session events to the host.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Prompt re-printed after asynchronous output, matching the interactive loop.
pub const INPUT_PROMPT: &str = "Enter command or message: ";

/// Application / crate version (populated from Cargo.toml via env! macro)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Human friendly version string used in the prompt banner.
pub fn full_version() -> String {
    format!("v{}", APP_VERSION)
}

/// Longest accepted handshake line, newline included.
pub const MAX_NAME_LINE_BYTES: usize = 1024;

/// Longest chat line a peer may send before its session is dropped.
pub const MAX_MESSAGE_LINE_BYTES: usize = 64 * 1024;
