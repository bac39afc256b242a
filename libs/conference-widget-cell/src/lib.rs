// libs/conference-widget-cell/src/lib.rs
//! # Conference Widget Cell
//!
//! Thin adapter around the embedded third-party conferencing widget. The
//! engine cannot run the provider's script itself; the embedding host
//! implements [`ConferencingBridge`] and relays the raw callback traffic.
//! This cell loads the provider script once per process, attaches the
//! widget for an acquired room, and normalizes the provider's loosely typed
//! callbacks into the closed [`WidgetEvent`] set the session coordinator
//! consumes.
//!
//! ```text
//! +----------------------------------------------------+
//! |               Conference Widget Cell               |
//! +----------------------------------------------------+
//! |  models.rs      |  Events, commands, launch DTOs   |
//! |  bridge.rs      |  Host bridge trait + channels    |
//! |  services/      |                                  |
//! |    script.rs    |  external_api.js loader          |
//! |    normalize.rs |  Raw -> normalized translation   |
//! |    adapter.rs   |  Mount, command, dispose         |
//! +----------------------------------------------------+
//! ```
//!
//! Disposal is a hard requirement: every exit path must call
//! [`WidgetHandle::dispose`] so the provider releases media and network
//! resources. Dropping an undisposed handle detaches best-effort and logs.

pub mod bridge;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use bridge::{BridgeCommand, BridgeSession, ConferencingBridge};
pub use models::{ProviderEvent, WidgetCommand, WidgetError, WidgetEvent, WidgetLaunch};
pub use services::{EventNormalizer, ScriptLoader, WidgetAdapter, WidgetHandle};
