// libs/device-check-cell/src/models.rs
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SIGNAL_WINDOW: Duration = Duration::from_secs(5);
pub const DEFAULT_MIN_LEVEL: f32 = 0.05;

// ==============================================================================
// DEVICE CHECK DOMAIN MODELS
// ==============================================================================

/// Status of a single capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityStatus {
    NotTested,
    Testing,
    Success,
    Error,
}

impl CapabilityStatus {
    pub fn is_final(&self) -> bool {
        matches!(self, CapabilityStatus::Success | CapabilityStatus::Error)
    }
}

/// Combined view of the three capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCheckReport {
    pub camera: CapabilityStatus,
    pub microphone: CapabilityStatus,
    pub audio_level: CapabilityStatus,
}

impl DeviceCheckReport {
    pub const fn untested() -> Self {
        Self {
            camera: CapabilityStatus::NotTested,
            microphone: CapabilityStatus::NotTested,
            audio_level: CapabilityStatus::NotTested,
        }
    }

    /// Every capability reached a final status; the check run is over.
    pub fn all_tested(&self) -> bool {
        self.statuses().iter().all(|s| s.is_final())
    }

    /// Every capability passed. Gates joining, not reaching ready state.
    pub fn all_ok(&self) -> bool {
        self.statuses()
            .iter()
            .all(|s| *s == CapabilityStatus::Success)
    }

    fn statuses(&self) -> [CapabilityStatus; 3] {
        [self.camera, self.microphone, self.audio_level]
    }
}

impl Default for DeviceCheckReport {
    fn default() -> Self {
        Self::untested()
    }
}

/// Constraints for a media acquisition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    /// The check requests both capabilities in one acquisition, so the user
    /// answers a single permission prompt.
    pub const fn audio_video() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceCheckSettings {
    /// How long the microphone is sampled before the level check gives up.
    pub signal_window: Duration,
    /// Normalized level a sample must reach to count as a signal.
    pub min_level: f32,
}

impl Default for DeviceCheckSettings {
    fn default() -> Self {
        Self {
            signal_window: DEFAULT_SIGNAL_WINDOW,
            min_level: DEFAULT_MIN_LEVEL,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum DeviceError {
    /// The user or platform refused camera/microphone access.
    #[error("Device access denied: {0}")]
    AccessDenied(String),

    /// The media backend failed for another reason.
    #[error("Media backend failure: {0}")]
    Backend(String),
}
