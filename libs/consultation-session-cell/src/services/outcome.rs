// libs/consultation-session-cell/src/services/outcome.rs

use std::sync::Arc;

use reqwest::Method;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::models::{OutcomeAck, SessionOutcome};

/// Serverless function that closes a consultation.
const FINALIZE_FUNCTION: &str = "finalizar-consulta";

#[derive(Debug, Error)]
pub enum OutcomeError {
    /// The request never produced an acknowledgment.
    #[error("Outcome submission failed: {0}")]
    SubmitFailed(String),

    /// The backend answered but did not accept the outcome.
    #[error("Outcome rejected: {0}")]
    Rejected(String),
}

/// Posts the consultation outcome to the backend. One attempt per call;
/// retry policy belongs to the caller, and the session coordinator
/// deliberately has none.
pub struct OutcomeGateway {
    supabase: Arc<SupabaseClient>,
}

impl OutcomeGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    #[instrument(skip(self, outcome, access_token), fields(consulta = %outcome.consulta_id))]
    pub async fn submit(
        &self,
        outcome: &SessionOutcome,
        access_token: Option<&str>,
    ) -> Result<OutcomeAck, OutcomeError> {
        let body = serde_json::to_value(outcome)
            .map_err(|err| OutcomeError::SubmitFailed(err.to_string()))?;

        let ack: OutcomeAck = self
            .supabase
            .invoke_function(Method::POST, FINALIZE_FUNCTION, access_token, Some(body))
            .await
            .map_err(|err| OutcomeError::SubmitFailed(err.to_string()))?;

        if !ack.success {
            warn!(message = %ack.message, "Backend did not accept the outcome");
            return Err(OutcomeError::Rejected(ack.message));
        }

        info!(
            duracao_minutos = outcome.duracao_minutos,
            "Consultation outcome recorded"
        );
        Ok(ack)
    }
}
