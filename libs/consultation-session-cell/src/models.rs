// libs/consultation-session-cell/src/models.rs

use device_check_cell::DeviceCheckReport;
use room_provisioning_cell::RoomError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_models::{ConsultationId, ParticipantRole};
use thiserror::Error;

// ==============================================================================
// SESSION STAGES
// ==============================================================================

/// Why a call moved from `Connected` into `Ending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The local participant hung up.
    UserLeft,
    /// The other party's connection ended after both had been present.
    RemoteLeft,
}

/// Lifecycle stage of one consultation session.
///
/// Each variant carries only the data valid for that stage: a duration can
/// never tick outside `Connected`, and an error can never linger into a
/// healthy stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    /// Requesting a room from the backend.
    AwaitingRoom,
    /// Running the camera/microphone/audio-level checks.
    DeviceCheck,
    /// Checks complete; waiting for the participant to join.
    ReadyToJoin,
    /// In the call. `elapsed_seconds` advances once per second.
    Connected { elapsed_seconds: u64 },
    /// Call over, outcome not yet confirmed. `frozen_seconds` never changes.
    Ending { frozen_seconds: u64, reason: EndReason },
    /// Session finished. `outcome_recorded` tells whether the backend
    /// accepted the consultation outcome.
    Terminated {
        duration_seconds: u64,
        outcome_recorded: bool,
    },
    /// Something broke; the only exit is an explicit retry.
    Failed { error: SessionError },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::AwaitingRoom => "awaiting_room",
            Stage::DeviceCheck => "device_check",
            Stage::ReadyToJoin => "ready_to_join",
            Stage::Connected { .. } => "connected",
            Stage::Ending { .. } => "ending",
            Stage::Terminated { .. } => "terminated",
            Stage::Failed { .. } => "failed",
        }
    }

    /// `Terminated` accepts no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Terminated { .. })
    }
}

// ==============================================================================
// SESSION ERRORS AND WARNINGS
// ==============================================================================

/// Errors that put the session into the `Failed` stage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SessionError {
    #[error("Room unavailable: {0}")]
    RoomUnavailable(String),

    #[error("Room request failed: {0}")]
    RoomRequestFailed(String),

    #[error("Conference widget failed to load: {0}")]
    WidgetLoad(String),

    #[error("Conference provider failed: {0}")]
    WidgetJoin(String),
}

impl From<RoomError> for SessionError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::RoomUnavailable { reason } => SessionError::RoomUnavailable(reason),
            RoomError::RoomRequestFailed { message } => SessionError::RoomRequestFailed(message),
        }
    }
}

/// Non-blocking conditions surfaced to the participant without stopping the
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SessionWarning {
    /// Join was refused because the device checks are not all green.
    DevicesNotReady,
    /// Join was refused because no room is held.
    RoomMissing,
    /// The consultation outcome could not be recorded on the backend.
    OutcomeNotRecorded(String),
}

impl std::fmt::Display for SessionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionWarning::DevicesNotReady => {
                write!(f, "Verifique camera e microfone antes de entrar na consulta")
            }
            SessionWarning::RoomMissing => {
                write!(f, "A sala da consulta ainda nao esta disponivel")
            }
            SessionWarning::OutcomeNotRecorded(detail) => {
                write!(f, "Nao foi possivel registrar a consulta: {}", detail)
            }
        }
    }
}

// ==============================================================================
// SNAPSHOT
// ==============================================================================

/// Point-in-time view of the session, published on every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub consultation_id: ConsultationId,
    pub stage: Stage,
    pub device_report: DeviceCheckReport,
    pub audio_muted: bool,
    pub video_muted: bool,
    pub participant_count: u32,
    pub warning: Option<SessionWarning>,
}

impl SessionSnapshot {
    pub fn new(consultation_id: ConsultationId) -> Self {
        Self {
            consultation_id,
            stage: Stage::AwaitingRoom,
            device_report: DeviceCheckReport::untested(),
            audio_muted: false,
            video_muted: false,
            participant_count: 0,
            warning: None,
        }
    }

    /// The join button should be enabled.
    pub fn can_join(&self) -> bool {
        matches!(self.stage, Stage::ReadyToJoin) && self.device_report.all_ok()
    }

    /// The outcome dialog should be shown.
    pub fn outcome_prompt_visible(&self) -> bool {
        matches!(self.stage, Stage::Ending { .. })
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        match &self.stage {
            Stage::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Call duration so far, when one exists for the current stage.
    pub fn elapsed_seconds(&self) -> Option<u64> {
        match self.stage {
            Stage::Connected { elapsed_seconds } => Some(elapsed_seconds),
            Stage::Ending { frozen_seconds, .. } => Some(frozen_seconds),
            Stage::Terminated {
                duration_seconds, ..
            } => Some(duration_seconds),
            _ => None,
        }
    }
}

// ==============================================================================
// OUTCOME CAPTURE
// ==============================================================================

/// Call quality rating, 1 (worst) to 5 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct QualityRating(u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Call quality rating must be between 1 and 5, got {0}")]
pub struct InvalidRating(pub u8);

impl QualityRating {
    pub fn new(value: u8) -> Result<Self, InvalidRating> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidRating(value))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for QualityRating {
    type Error = InvalidRating;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QualityRating> for u8 {
    fn from(rating: QualityRating) -> Self {
        rating.0
    }
}

/// What the participant filled into the outcome dialog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeDraft {
    pub notes: Option<String>,
    pub technical_issues: Option<String>,
    pub quality_rating: Option<QualityRating>,
}

/// Body posted to `finalizar-consulta`. Optional fields are omitted, not
/// sent as null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    #[serde(rename = "consultaId")]
    pub consulta_id: ConsultationId,
    #[serde(rename = "duracaoMinutos")]
    pub duracao_minutos: u64,
    #[serde(rename = "observacoesMedico", skip_serializing_if = "Option::is_none")]
    pub observacoes_medico: Option<String>,
    #[serde(rename = "observacoesPaciente", skip_serializing_if = "Option::is_none")]
    pub observacoes_paciente: Option<String>,
    #[serde(rename = "problemasTecnicos", skip_serializing_if = "Option::is_none")]
    pub problemas_tecnicos: Option<String>,
    #[serde(rename = "qualidadeChamada", skip_serializing_if = "Option::is_none")]
    pub qualidade_chamada: Option<QualityRating>,
}

impl SessionOutcome {
    /// Builds the outcome body from the frozen call duration and the
    /// participant's draft. Duration is floored to whole minutes, and the
    /// free-text notes land in the field matching the author's role.
    pub fn from_draft(
        consultation_id: &ConsultationId,
        role: ParticipantRole,
        frozen_seconds: u64,
        draft: &OutcomeDraft,
    ) -> Self {
        let notes = clean(&draft.notes);
        let (observacoes_medico, observacoes_paciente) = match role {
            ParticipantRole::Doctor => (notes, None),
            ParticipantRole::Patient => (None, notes),
        };

        Self {
            consulta_id: consultation_id.clone(),
            duracao_minutos: frozen_seconds / 60,
            observacoes_medico,
            observacoes_paciente,
            problemas_tecnicos: clean(&draft.technical_issues),
            qualidade_chamada: draft.quality_rating,
        }
    }
}

fn clean(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// `finalizar-consulta` acknowledgment.
#[derive(Debug, Clone, Deserialize)]
pub struct OutcomeAck {
    pub success: bool,
    #[serde(default)]
    pub consulta: Value,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn consultation() -> ConsultationId {
        ConsultationId::new("abc-1").unwrap()
    }

    #[test]
    fn quality_rating_rejects_out_of_range_values() {
        assert!(QualityRating::new(0).is_err());
        assert!(QualityRating::new(6).is_err());
        for value in 1..=5 {
            assert_eq!(QualityRating::new(value).unwrap().get(), value);
        }
    }

    #[test]
    fn quality_rating_deserializes_through_validation() {
        let rating: QualityRating = serde_json::from_value(json!(4)).unwrap();
        assert_eq!(rating.get(), 4);
        assert!(serde_json::from_value::<QualityRating>(json!(9)).is_err());
    }

    #[test]
    fn duration_is_floored_to_whole_minutes() {
        let draft = OutcomeDraft::default();
        for (seconds, minutes) in [(125, 2), (59, 0), (60, 1), (0, 0)] {
            let outcome =
                SessionOutcome::from_draft(&consultation(), ParticipantRole::Patient, seconds, &draft);
            assert_eq!(outcome.duracao_minutos, minutes);
        }
    }

    #[test]
    fn notes_follow_the_author_role() {
        let draft = OutcomeDraft {
            notes: Some("  paciente estavel  ".to_string()),
            ..OutcomeDraft::default()
        };

        let from_doctor =
            SessionOutcome::from_draft(&consultation(), ParticipantRole::Doctor, 300, &draft);
        assert_eq!(from_doctor.observacoes_medico.as_deref(), Some("paciente estavel"));
        assert_eq!(from_doctor.observacoes_paciente, None);

        let from_patient =
            SessionOutcome::from_draft(&consultation(), ParticipantRole::Patient, 300, &draft);
        assert_eq!(from_patient.observacoes_medico, None);
        assert_eq!(from_patient.observacoes_paciente.as_deref(), Some("paciente estavel"));
    }

    #[test]
    fn outcome_body_omits_empty_optionals() {
        let outcome = SessionOutcome::from_draft(
            &consultation(),
            ParticipantRole::Patient,
            125,
            &OutcomeDraft {
                notes: Some("   ".to_string()),
                technical_issues: None,
                quality_rating: QualityRating::new(4).ok(),
            },
        );

        let body = serde_json::to_value(&outcome).unwrap();
        assert_eq!(body["consultaId"], json!("abc-1"));
        assert_eq!(body["duracaoMinutos"], json!(2));
        assert_eq!(body["qualidadeChamada"], json!(4));
        assert!(body.get("observacoesMedico").is_none());
        assert!(body.get("observacoesPaciente").is_none());
        assert!(body.get("problemasTecnicos").is_none());
    }

    #[test]
    fn snapshot_gates_follow_the_stage() {
        let mut snapshot = SessionSnapshot::new(consultation());
        assert!(!snapshot.can_join());
        assert_eq!(snapshot.elapsed_seconds(), None);

        snapshot.stage = Stage::Ending {
            frozen_seconds: 125,
            reason: EndReason::UserLeft,
        };
        assert!(snapshot.outcome_prompt_visible());
        assert_eq!(snapshot.elapsed_seconds(), Some(125));

        snapshot.stage = Stage::Failed {
            error: SessionError::RoomUnavailable("401".to_string()),
        };
        assert!(snapshot.last_error().is_some());
    }
}
