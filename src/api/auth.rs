use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;

use crate::auth::Session;
use crate::errors::AppError;
use crate::AppState;

/// Caller with administrator rights, checked against the stored account.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

/// Caller on the event stream. Browsers cannot set headers on a WebSocket
/// handshake, so `?token=` is accepted alongside the bearer header.
#[derive(Debug, Clone)]
pub struct StreamSession(pub Session);

#[derive(Deserialize)]
struct StreamParams {
    token: Option<String>,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Session built per request from `Authorization: Bearer <token>`.
///
/// Handlers that must report the missing session themselves take
/// `Option<Session>` instead.
#[axum::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        Ok(state.accounts.signer().verify(token)?)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        if !session.is_admin {
            tracing::warn!(user_id = %session.user_id, "Admin route refused");
            return Err(AppError::Forbidden);
        }

        // The token's claim only holds until the account is demoted or suspended.
        let account = state
            .store
            .get_user(session.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if !account.is_admin || !account.is_active {
            tracing::warn!(user_id = %session.user_id, "Admin route refused for revoked account");
            return Err(AppError::Forbidden);
        }

        Ok(AdminSession(session))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for StreamSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(parts) {
            Some(token) => token.to_string(),
            None => Query::<StreamParams>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(params)| params.token)
                .filter(|t| !t.trim().is_empty())
                .ok_or(AppError::Unauthorized)?,
        };
        let mut session = state.accounts.signer().verify(&token)?;

        // Admin visibility follows the stored account, not the token claim.
        if session.is_admin {
            session.is_admin = matches!(
                state.store.get_user(session.user_id).await?,
                Some(account) if account.is_admin && account.is_active
            );
        }

        Ok(StreamSession(session))
    }
}
