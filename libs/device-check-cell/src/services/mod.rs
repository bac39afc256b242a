// libs/device-check-cell/src/services/mod.rs

pub mod check;

pub use check::DeviceCheckService;
