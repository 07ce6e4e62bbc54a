use crate::events::{
    dispatcher,
    model::{LogEvent, LogLevel, NetworkEvent, SystemEvent},
};

/// Emit a structured network event tagged with a fresh correlation id.
pub(crate) fn emit_network_event(
    component: &'static str,
    level: LogLevel,
    action: &str,
    addr: Option<String>,
    detail: Option<String>,
) {
    let mut meta = dispatcher::meta(component, level);
    meta.corr_id = Some(dispatcher::correlation_id());
    dispatcher::emit(LogEvent::Network(NetworkEvent {
        meta,
        action: action.to_string(),
        addr,
        detail,
    }));
}

/// Emit a lifecycle event that is not tied to a single socket address.
pub(crate) fn emit_system_event(
    component: &'static str,
    level: LogLevel,
    action: &str,
    detail: Option<String>,
) {
    let mut meta = dispatcher::meta(component, level);
    meta.corr_id = Some(dispatcher::correlation_id());
    dispatcher::emit(LogEvent::System(SystemEvent {
        meta,
        action: action.to_string(),
        detail,
    }));
}
