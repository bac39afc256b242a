use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{Identity, ParticipantRole};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub jitsi_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            jitsi_base_url: "https://meet.jit.si".to_string(),
        }
    }
}

impl TestConfig {
    /// Points every backend call at a mock server.
    pub fn for_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn with_jitsi(mut self, uri: &str) -> Self {
        self.jitsi_base_url = uri.trim_end_matches('/').to_string();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            functions_base_url: format!(
                "{}/functions/v1",
                self.supabase_url.trim_end_matches('/')
            ),
            jitsi_base_url: self.jitsi_base_url.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestIdentity {
    pub id: String,
    pub display_name: String,
    pub role: ParticipantRole,
}

impl Default for TestIdentity {
    fn default() -> Self {
        Self::patient("Carlos Mendes")
    }
}

impl TestIdentity {
    pub fn new(display_name: &str, role: ParticipantRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            role,
        }
    }

    pub fn doctor(display_name: &str) -> Self {
        Self::new(display_name, ParticipantRole::Doctor)
    }

    pub fn patient(display_name: &str) -> Self {
        Self::new(display_name, ParticipantRole::Patient)
    }

    pub fn to_identity(&self) -> Identity {
        Identity::new(self.id.clone(), self.display_name.clone(), self.role)
    }
}

pub struct TokenTestUtils;

impl TokenTestUtils {
    /// Builds a structurally valid JWT. The signature segment is junk; the
    /// engine never verifies signatures, only the claims segment.
    pub fn create_token(identity: &TestIdentity, expires_in_hours: Option<i64>) -> String {
        let now = Utc::now();

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let mut payload = json!({
            "sub": identity.id,
            "email": format!("{}@example.com", identity.role),
            "role": "authenticated",
            "iat": now.timestamp()
        });
        if let Some(hours) = expires_in_hours {
            payload["exp"] = json!((now + Duration::hours(hours)).timestamp());
        }

        let header_encoded = URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
        let signature_encoded = URL_SAFE_NO_PAD.encode(b"test-signature");

        format!("{}.{}.{}", header_encoded, payload_encoded, signature_encoded)
    }

    pub fn create_expired_token(identity: &TestIdentity) -> String {
        Self::create_token(identity, Some(-1))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockBackendResponses;

impl MockBackendResponses {
    /// Success body of `gerar-sala-jitsi/{consultationId}`.
    pub fn room_response(consultation_id: &str, room_name: &str) -> serde_json::Value {
        json!({
            "consultaId": consultation_id,
            "nomeSala": room_name,
            "urlSala": format!("https://meet.jit.si/{}", room_name),
            "config": {
                "roomName": room_name,
                "subject": format!("Consulta {}", consultation_id),
                "userInfo": {
                    "displayName": ""
                },
                "configOverwrite": {
                    "prejoinPageEnabled": false,
                    "startWithAudioMuted": false,
                    "startWithVideoMuted": false,
                    "disableDeepLinking": true,
                    "resolution": 720
                },
                "interfaceConfigOverwrite": {
                    "TOOLBAR_BUTTONS": ["microphone", "camera", "desktop", "hangup", "tileview"],
                    "SHOW_JITSI_WATERMARK": false,
                    "MOBILE_APP_PROMO": false
                }
            },
            "createdAt": "2025-03-10T13:00:00Z"
        })
    }

    /// Success body of `finalizar-consulta`.
    pub fn outcome_ack_response(consultation_id: &str) -> serde_json::Value {
        json!({
            "success": true,
            "consulta": {
                "id": consultation_id,
                "status": "finalizada"
            },
            "message": "Consulta finalizada com sucesso"
        })
    }

    pub fn error_response(message: &str) -> serde_json::Value {
        json!({
            "error": message
        })
    }
}
