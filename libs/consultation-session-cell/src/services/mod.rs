// libs/consultation-session-cell/src/services/mod.rs

pub mod coordinator;
pub mod outcome;

pub use coordinator::{SessionCoordinator, SessionParams};
pub use outcome::{OutcomeError, OutcomeGateway};
