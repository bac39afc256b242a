// libs/consultation-session-cell/src/lib.rs
//! # Consultation Session Cell
//!
//! Drives a video consultation from mount to teardown. One spawned task owns
//! every piece of session state and is the only place a stage transition
//! happens; hosts observe through cheap watch channels and steer through
//! fire-and-forget commands.
//!
//! ```text
//! +------------------------------------------------------+
//! |              Consultation Session Cell               |
//! +------------------------------------------------------+
//! |  models.rs         |  Stage machine, snapshot, DTOs  |
//! |  services/         |                                 |
//! |    coordinator.rs  |  Session task + command handle  |
//! |    outcome.rs      |  finalizar-consulta client      |
//! +------------------------------------------------------+
//!
//! AwaitingRoom -> DeviceCheck -> ReadyToJoin -> Connected
//!       |                                          |
//!       v                                          v
//!     Failed (exit: manual retry)       Ending -> Terminated
//! ```
//!
//! The call timer is a one-second interval armed only while `Connected`; the
//! count freezes the instant `Ending` is entered and the frozen value is what
//! `finalizar-consulta` receives, floored to whole minutes. Outcome
//! submission is attempted exactly once and never blocks termination.
//!
//! Reaching `Terminated` (or dropping the handle) stops the task; the device
//! stream, the conference widget, and the ticker are all released on every
//! exit path, including abort.

pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::{
    EndReason, InvalidRating, OutcomeAck, OutcomeDraft, QualityRating, SessionError,
    SessionOutcome, SessionSnapshot, SessionWarning, Stage,
};
pub use services::{OutcomeError, OutcomeGateway, SessionCoordinator, SessionParams};
