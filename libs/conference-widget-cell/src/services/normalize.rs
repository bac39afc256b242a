// libs/conference-widget-cell/src/services/normalize.rs
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{ProviderEvent, WidgetEvent};

/// Stateful translator from raw provider callbacks to the closed
/// [`WidgetEvent`] set. Tracks the participant count because the provider
/// only reports individual joins and leaves.
pub struct EventNormalizer {
    participants: u32,
}

impl EventNormalizer {
    pub fn new() -> Self {
        Self { participants: 0 }
    }

    pub fn participants(&self) -> u32 {
        self.participants
    }

    /// Translates one raw callback into zero or more normalized events.
    /// Unknown names and malformed payloads are dropped here, at the
    /// boundary, so the coordinator only ever sees the closed set.
    pub fn normalize(&mut self, raw: &ProviderEvent) -> Vec<WidgetEvent> {
        match raw.name.as_str() {
            "videoConferenceJoined" => {
                self.participants = 1;
                vec![
                    WidgetEvent::Joined,
                    WidgetEvent::ParticipantCountChanged(1),
                ]
            }
            "participantJoined" => {
                self.participants = self.participants.saturating_add(1);
                vec![WidgetEvent::ParticipantCountChanged(self.participants)]
            }
            "participantLeft" => {
                self.participants = self.participants.saturating_sub(1);
                vec![WidgetEvent::ParticipantCountChanged(self.participants)]
            }
            "audioMuteStatusChanged" => match muted_flag(&raw.payload) {
                Some(muted) => vec![WidgetEvent::AudioMuteChanged(muted)],
                None => {
                    warn!("Malformed audioMuteStatusChanged payload, dropping");
                    Vec::new()
                }
            },
            "videoMuteStatusChanged" => match muted_flag(&raw.payload) {
                Some(muted) => vec![WidgetEvent::VideoMuteChanged(muted)],
                None => {
                    warn!("Malformed videoMuteStatusChanged payload, dropping");
                    Vec::new()
                }
            },
            "videoConferenceLeft" | "readyToClose" => vec![WidgetEvent::Left],
            "errorOccurred" | "connectionFailed" | "conferenceFailed" => {
                vec![WidgetEvent::LoadError(error_description(&raw.payload))]
            }
            other => {
                debug!(event = other, "Ignoring unrecognized provider event");
                Vec::new()
            }
        }
    }
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn muted_flag(payload: &Value) -> Option<bool> {
    payload.get("muted").and_then(Value::as_bool)
}

fn error_description(payload: &Value) -> String {
    payload
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| payload.get("error").and_then(Value::as_str))
        .unwrap_or("provider reported an error")
        .to_string()
}
