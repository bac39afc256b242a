// libs/room-provisioning-cell/src/lib.rs
//! # Room Provisioning Cell
//!
//! Acquires the conferencing room for a consultation from the backend's
//! `gerar-sala-jitsi` serverless function and derives deterministic room
//! names so both participants converge on the same room without any
//! coordination round-trip.
//!
//! ```text
//! +--------------------------------------------------+
//! |              Room Provisioning Cell              |
//! +--------------------------------------------------+
//! |  models.rs      |  Room, join config, wire DTOs  |
//! |  naming.rs      |  Deterministic name derivation |
//! |  services/      |                                |
//! |    provisioner.rs| gerar-sala-jitsi client       |
//! +--------------------------------------------------+
//! ```
//!
//! A room is acquired at most once per mounted session and is immutable
//! afterwards. Acquisition failures are never retried automatically; retry
//! is a user decision surfaced by the session coordinator.

pub mod models;
pub mod naming;
pub mod services;

// Re-export commonly used types
pub use models::{ConfigOverwrite, InterfaceConfigOverwrite, Room, RoomConfig, RoomError, RoomResponse, UserInfo};
pub use naming::{derive_room_name, sanitize_display_name};
pub use services::RoomProvisioner;
