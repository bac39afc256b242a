// libs/room-provisioning-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::ConsultationId;

// ==============================================================================
// ROOM PROVISIONING DOMAIN MODELS
// ==============================================================================

/// A provisioned conferencing room. Immutable once acquired; owned by the
/// session that requested it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub consultation_id: ConsultationId,
    pub name: String,
    pub url: String,
    pub config: RoomConfig,
    pub created_at: DateTime<Utc>,
}

/// Join configuration the conferencing widget is mounted with. Mirrors the
/// provisioning endpoint's `config` object field for field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    #[serde(rename = "roomName")]
    pub room_name: String,

    #[serde(default)]
    pub subject: String,

    #[serde(rename = "userInfo", default)]
    pub user_info: UserInfo,

    #[serde(rename = "configOverwrite", default)]
    pub config_overwrite: ConfigOverwrite,

    #[serde(rename = "interfaceConfigOverwrite", default)]
    pub interface_config_overwrite: InterfaceConfigOverwrite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(rename = "displayName", default)]
    pub display_name: String,
}

/// Provider behaviour overrides. The pre-join screen stays disabled because
/// the engine runs its own device check before the widget is mounted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverwrite {
    #[serde(rename = "prejoinPageEnabled", default)]
    pub prejoin_page_enabled: bool,

    #[serde(rename = "startWithAudioMuted", default)]
    pub start_with_audio_muted: bool,

    #[serde(rename = "startWithVideoMuted", default)]
    pub start_with_video_muted: bool,

    #[serde(rename = "disableDeepLinking", default = "default_true")]
    pub disable_deep_linking: bool,

    #[serde(default = "default_resolution")]
    pub resolution: u32,
}

impl Default for ConfigOverwrite {
    fn default() -> Self {
        Self {
            prejoin_page_enabled: false,
            start_with_audio_muted: false,
            start_with_video_muted: false,
            disable_deep_linking: true,
            resolution: default_resolution(),
        }
    }
}

/// Interface chrome overrides, uppercase keys as the provider expects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceConfigOverwrite {
    #[serde(rename = "TOOLBAR_BUTTONS", default = "default_toolbar_buttons")]
    pub toolbar_buttons: Vec<String>,

    #[serde(rename = "SHOW_JITSI_WATERMARK", default)]
    pub show_jitsi_watermark: bool,

    #[serde(rename = "MOBILE_APP_PROMO", default)]
    pub mobile_app_promo: bool,
}

impl Default for InterfaceConfigOverwrite {
    fn default() -> Self {
        Self {
            toolbar_buttons: default_toolbar_buttons(),
            show_jitsi_watermark: false,
            mobile_app_promo: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_resolution() -> u32 {
    720
}

fn default_toolbar_buttons() -> Vec<String> {
    ["microphone", "camera", "desktop", "hangup", "tileview"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// ==============================================================================
// WIRE SHAPES
// ==============================================================================

/// Success body of `GET gerar-sala-jitsi/{consultationId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomResponse {
    #[serde(rename = "consultaId")]
    pub consulta_id: String,

    #[serde(rename = "nomeSala")]
    pub nome_sala: String,

    #[serde(rename = "urlSala")]
    pub url_sala: String,

    pub config: RoomConfig,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// The caller is not authenticated, or the backend refused the token.
    #[error("Room unavailable: {reason}")]
    RoomUnavailable { reason: String },

    /// Network or backend failure while requesting the room.
    #[error("Room request failed: {message}")]
    RoomRequestFailed { message: String },
}
