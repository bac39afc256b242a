use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of the local participant in a consultation. Always passed explicitly;
/// the engine never infers a role from an email address or token metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Patient,
    Doctor,
}

impl ParticipantRole {
    pub fn is_doctor(&self) -> bool {
        matches!(self, ParticipantRole::Doctor)
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantRole::Patient => write!(f, "patient"),
            ParticipantRole::Doctor => write!(f, "doctor"),
        }
    }
}

/// Authenticated identity the host hands to the session engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub role: ParticipantRole,
}

impl Identity {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        role: ParticipantRole,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role,
        }
    }
}

/// Claim subset the engine reads from an access token. Signature
/// verification happens server-side; these claims are only inspected to
/// decide whether a token is present and unexpired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
}
