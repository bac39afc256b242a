// libs/room-provisioning-cell/src/services/provisioner.rs
use std::sync::Arc;

use reqwest::Method;
use tracing::{info, instrument, warn};

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};
use shared_models::{ConsultationId, Identity};
use shared_utils::token;

use crate::models::{Room, RoomError, RoomResponse};
use crate::naming::{derive_room_name, sanitize_display_name};

pub struct RoomProvisioner {
    supabase: Arc<SupabaseClient>,
}

impl RoomProvisioner {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Acquires the conferencing room for a consultation.
    ///
    /// Requires a usable access token; the request is never sent
    /// unauthenticated. Failures are not retried here: retrying is a user
    /// decision surfaced by the session coordinator.
    #[instrument(skip(self, identity, access_token), fields(consulta = %consultation_id))]
    pub async fn acquire_room(
        &self,
        consultation_id: &ConsultationId,
        identity: &Identity,
        access_token: Option<&str>,
    ) -> Result<Room, RoomError> {
        let token = match access_token {
            Some(t) if token::is_usable(t) => t,
            _ => {
                warn!("Refusing room request without a usable access token");
                return Err(RoomError::RoomUnavailable {
                    reason: "not authenticated".to_string(),
                });
            }
        };

        let path = format!("gerar-sala-jitsi/{}", consultation_id);
        let response: RoomResponse = self
            .supabase
            .invoke_function(Method::GET, &path, Some(token), None)
            .await
            .map_err(classify)?;

        let expected = derive_room_name(consultation_id);
        if response.nome_sala != expected {
            // Both participants still converge: each uses the backend's answer.
            warn!(
                expected = %expected,
                received = %response.nome_sala,
                "Backend room name differs from local derivation"
            );
        }

        let mut config = response.config;
        let sanitized = if config.user_info.display_name.trim().is_empty() {
            sanitize_display_name(&identity.display_name)
        } else {
            sanitize_display_name(&config.user_info.display_name)
        };
        config.user_info.display_name = sanitized;

        info!(room = %response.nome_sala, "Room acquired");

        Ok(Room {
            consultation_id: consultation_id.clone(),
            name: response.nome_sala,
            url: response.url_sala,
            config,
            created_at: response.created_at,
        })
    }
}

fn classify(error: SupabaseError) -> RoomError {
    if error.is_auth() {
        RoomError::RoomUnavailable {
            reason: error.to_string(),
        }
    } else {
        RoomError::RoomRequestFailed {
            message: error.to_string(),
        }
    }
}
