// libs/device-check-cell/src/lib.rs
//! # Device Check Cell
//!
//! Pre-call readiness verification for the camera, the microphone, and the
//! microphone's signal level. One combined audio+video acquisition per run;
//! each capability moves `NotTested -> Testing -> Success | Error` and the
//! combined report decides whether the join gate opens.
//!
//! The actual device access lives behind [`MediaBackend`], implemented by
//! the embedding host. The acquired stream is kept for the host's preview
//! until [`DeviceCheckService::reset`] or drop releases it; stream ownership
//! is handed over before anything else (the conferencing widget) acquires
//! the devices.

pub mod backend;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use backend::{MediaBackend, MediaStreamHandle};
pub use models::{
    CapabilityStatus, DeviceCheckReport, DeviceCheckSettings, DeviceError, MediaConstraints,
};
pub use services::DeviceCheckService;
