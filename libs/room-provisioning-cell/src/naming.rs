// libs/room-provisioning-cell/src/naming.rs
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use regex::Regex;
use sha2::{Digest, Sha256};

use shared_models::ConsultationId;

const ROOM_NAME_PREFIX: &str = "consulta";
const DIGEST_BYTES: usize = 16;
const MAX_DISPLAY_NAME_LEN: usize = 80;

/// Derives the conferencing room name for a consultation.
///
/// Pure function of the consultation id: both participants derive the same
/// name independently and land in the same room with no coordination
/// round-trip. Hashing keeps the name free of patient data and safe to put
/// in a URL.
pub fn derive_room_name(consultation_id: &ConsultationId) -> String {
    let digest = Sha256::digest(consultation_id.as_str().as_bytes());
    let encoded = URL_SAFE_NO_PAD.encode(&digest[..DIGEST_BYTES]);
    format!("{}-{}", ROOM_NAME_PREFIX, encoded)
}

/// Cleans a display name before it enters the widget configuration: control
/// and format characters stripped, whitespace collapsed, length bounded.
pub fn sanitize_display_name(raw: &str) -> String {
    let controls = Regex::new(r"[\p{Cc}\p{Cf}]").unwrap();
    let without_controls = controls.replace_all(raw, " ");

    let whitespace = Regex::new(r"\s+").unwrap();
    let collapsed = whitespace.replace_all(without_controls.trim(), " ");

    collapsed.chars().take(MAX_DISPLAY_NAME_LEN).collect()
}
