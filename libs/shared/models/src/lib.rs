pub mod auth;
pub mod consultation;
pub mod error;

pub use auth::{Identity, ParticipantRole, TokenClaims};
pub use consultation::{ConsultationId, InvalidConsultationId};
pub use error::BackendErrorBody;
