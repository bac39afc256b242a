// libs/conference-widget-cell/src/models.rs
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use room_provisioning_cell::Room;

// ==============================================================================
// WIDGET EVENTS AND COMMANDS
// ==============================================================================

/// Normalized widget events. This set is closed: the session coordinator
/// reacts to exactly these and nothing else crosses the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// The local participant finished joining the conference.
    Joined,
    /// Somebody joined or left; the new total participant count.
    ParticipantCountChanged(u32),
    AudioMuteChanged(bool),
    VideoMuteChanged(bool),
    /// The local participant left the conference.
    Left,
    /// The provider failed to load or lost the conference.
    LoadError(String),
}

/// Commands the coordinator can issue on a live widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetCommand {
    ToggleAudio,
    ToggleVideo,
    ToggleScreenShare,
    Hangup,
}

impl WidgetCommand {
    /// The provider's wire name for this command.
    pub fn provider_name(&self) -> &'static str {
        match self {
            WidgetCommand::ToggleAudio => "toggleAudio",
            WidgetCommand::ToggleVideo => "toggleVideo",
            WidgetCommand::ToggleScreenShare => "toggleShareScreen",
            WidgetCommand::Hangup => "hangup",
        }
    }
}

/// Raw provider callback: an event name and a loosely typed payload,
/// exactly as the host bridge received it. Normalized once, at the adapter
/// boundary.
#[derive(Debug, Clone)]
pub struct ProviderEvent {
    pub name: String,
    pub payload: Value,
}

impl ProviderEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }
}

/// Everything the host needs to attach the provider widget.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetLaunch {
    pub script_url: String,
    pub room_name: String,
    pub join_url: String,
    /// The acquired room's join configuration, serialized for the provider.
    pub config: Value,
}

impl WidgetLaunch {
    pub fn for_room(script_url: &str, room: &Room) -> Self {
        Self {
            script_url: script_url.to_string(),
            room_name: room.name.clone(),
            join_url: room.url.clone(),
            config: serde_json::to_value(&room.config).unwrap_or(Value::Null),
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum WidgetError {
    /// The provider's entry-point script could not be fetched.
    #[error("Conferencing script failed to load: {0}")]
    ScriptLoad(String),

    /// The host bridge failed to attach the widget.
    #[error("Widget bridge failure: {0}")]
    Bridge(#[from] anyhow::Error),

    /// The provider side went away; commands can no longer be delivered.
    #[error("Provider connection closed")]
    ProviderGone,

    #[error("Widget already disposed")]
    Disposed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_match_the_widget_api() {
        assert_eq!(WidgetCommand::ToggleAudio.provider_name(), "toggleAudio");
        assert_eq!(WidgetCommand::ToggleVideo.provider_name(), "toggleVideo");
        assert_eq!(
            WidgetCommand::ToggleScreenShare.provider_name(),
            "toggleShareScreen"
        );
        assert_eq!(WidgetCommand::Hangup.provider_name(), "hangup");
    }
}
