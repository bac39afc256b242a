use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a scheduled consultation, shared by both participants.
///
/// Opaque and backend-assigned; the only constraint the engine enforces is
/// that it is non-blank, because room naming and every serverless call key
/// off it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsultationId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("consultation id must not be blank")]
pub struct InvalidConsultationId;

impl ConsultationId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidConsultationId> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InvalidConsultationId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConsultationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
