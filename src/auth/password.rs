use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use super::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// Salted digest stored as `salt$base64(hmac_sha256(salt, password))`.
pub fn hash_password(password: &str) -> Result<String, SessionError> {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = digest(&salt, password)?;
    Ok(format!("{salt}${}", BASE64.encode(digest)))
}

/// Constant-time comparison against a stored digest.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, encoded)) = stored.split_once('$') else {
        return false;
    };
    let Ok(expected) = BASE64.decode(encoded) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(salt.as_bytes()) else {
        return false;
    };
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

fn digest(salt: &str, password: &str) -> Result<Vec<u8>, SessionError> {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes())
        .map_err(|e| SessionError::HmacError(e.to_string()))?;
    mac.update(password.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}
