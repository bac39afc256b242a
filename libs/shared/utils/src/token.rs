use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use tracing::debug;

use shared_models::TokenClaims;

/// Decodes the claims segment of a JWT without verifying the signature.
///
/// The engine runs on the client side of the trust boundary: it only needs
/// to know whether an access token is present and unexpired before spending
/// a network round-trip. Signature verification stays with the backend.
pub fn peek_claims(token: &str) -> Result<TokenClaims, String> {
    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    // Decode claims
    let claims_json = match URL_SAFE_NO_PAD.decode(parts[1]) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    // Parse claims
    let claims: TokenClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    Ok(claims)
}

pub fn is_expired(claims: &TokenClaims) -> bool {
    match claims.exp {
        Some(exp) => {
            let now = chrono::Utc::now().timestamp() as u64;
            exp < now
        }
        None => false,
    }
}

/// Whether a token can back an authenticated call right now.
pub fn is_usable(token: &str) -> bool {
    match peek_claims(token) {
        Ok(claims) => {
            if is_expired(&claims) {
                debug!("Token for {} has expired", claims.sub);
                return false;
            }
            true
        }
        Err(reason) => {
            debug!("Token rejected: {}", reason);
            false
        }
    }
}
