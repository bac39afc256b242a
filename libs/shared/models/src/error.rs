use serde::{Deserialize, Serialize};

/// Error body the backend's serverless endpoints return on non-2xx
/// responses: `{ "error": "<message>" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendErrorBody {
    pub error: String,
}

impl BackendErrorBody {
    /// Extracts the backend's error message from a raw response body,
    /// falling back to the body text when it is not the documented shape.
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<BackendErrorBody>(body) {
            Ok(parsed) => parsed.error,
            Err(_) => body.trim().to_string(),
        }
    }
}
