use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,

    #[error("session signature mismatch")]
    BadSignature,

    #[error("session expired")]
    Expired,

    #[error("HMAC computation failed: {0}")]
    HmacError(String),

    #[error("claims encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Signed contents of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    username: String,
    admin: bool,
    exp: i64,
}

/// The authenticated caller of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

/// Issues and verifies `claims.signature` bearer tokens (both parts
/// URL-safe base64, signature is HMAC-SHA256 over the claims bytes).
#[derive(Clone)]
pub struct SessionSigner {
    secret: Arc<[u8]>,
    ttl: Duration,
}

impl SessionSigner {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            secret: Arc::from(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, SessionError> {
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            admin: user.is_admin,
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        let payload = serde_json::to_vec(&claims)?;
        let signature = self.sign(&payload)?;

        Ok(format!(
            "{}.{}",
            BASE64_URL.encode(&payload),
            BASE64_URL.encode(signature)
        ))
    }

    pub fn verify(&self, token: &str) -> Result<Session, SessionError> {
        let (payload_b64, signature_b64) = token.split_once('.').ok_or(SessionError::Malformed)?;
        let payload = BASE64_URL
            .decode(payload_b64)
            .map_err(|_| SessionError::Malformed)?;
        let signature = BASE64_URL
            .decode(signature_b64)
            .map_err(|_| SessionError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| SessionError::HmacError(e.to_string()))?;
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::BadSignature)?;

        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| SessionError::Malformed)?;
        if claims.exp < Utc::now().timestamp() {
            return Err(SessionError::Expired);
        }

        Ok(Session {
            user_id: claims.sub,
            username: claims.username,
            is_admin: claims.admin,
        })
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SessionError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| SessionError::HmacError(e.to_string()))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
