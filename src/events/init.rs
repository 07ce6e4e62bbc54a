use crate::config::LoggingConfig;
use crate::constants::DEFAULT_JSON_LOG_PATH;
use crate::events::dispatcher::init_events;
use crate::events::model::LogLevel;
use crate::events::sink::{ConsoleSink, JsonFileSink, LogSink, Rotation};
use std::sync::Arc;

const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Build the console and JSON sinks described by `logging` and install them.
///
/// The console sink defaults to `warn` so routine session chatter does not
/// interleave with the interactive prompt.
pub async fn init_events_from_config(logging: Option<&LoggingConfig>) {
    let mut sinks: Vec<Arc<dyn LogSink>> = Vec::new();

    let disable_console = logging.and_then(|l| l.disable_console).unwrap_or(false);
    if !disable_console {
        let min = logging
            .and_then(|l| l.console_level)
            .unwrap_or(LogLevel::Warn);
        sinks.push(Arc::new(ConsoleSink::new(Some(min))));
    }

    let json_path = logging
        .and_then(|l| l.json_path.clone())
        .unwrap_or_else(|| DEFAULT_JSON_LOG_PATH.into());
    let rotation = Rotation {
        max_bytes: logging
            .and_then(|l| l.json_max_bytes)
            .unwrap_or(5 * 1024 * 1024) as u64,
        keep: logging.and_then(|l| l.json_rotate).unwrap_or(3),
    };
    match JsonFileSink::open(&json_path, rotation).await {
        Ok(json_sink) => sinks.push(Arc::new(json_sink)),
        Err(e) => eprintln!("⚠️ Event log '{}' unavailable: {}", json_path, e),
    }
    init_events(sinks, EVENT_QUEUE_CAPACITY).await;
}
