// libs/room-provisioning-cell/src/services/mod.rs

pub mod provisioner;

pub use provisioner::RoomProvisioner;
