use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::SessionError;
use crate::db::StoreError;
use crate::engine::{BetRejection, SettlementError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Rejected(#[from] BetRejection),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    kind: &'static str,
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthenticated"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            AppError::Rejected(rejection) => {
                let status = match rejection {
                    BetRejection::Unauthenticated => StatusCode::UNAUTHORIZED,
                    BetRejection::AccountSuspended => StatusCode::FORBIDDEN,
                    BetRejection::InsufficientBalance { .. }
                    | BetRejection::GameNotBettable { .. }
                    | BetRejection::OddsChanged { .. } => StatusCode::CONFLICT,
                    BetRejection::InvalidStake | BetRejection::InvalidOdds => {
                        StatusCode::BAD_REQUEST
                    }
                };
                (status, rejection.kind())
            }
            AppError::Settlement(err) => match err {
                SettlementError::GameNotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
                SettlementError::GameNotCompleted { .. } => {
                    (StatusCode::CONFLICT, "GameNotCompleted")
                }
                SettlementError::MissingScores(_) => (StatusCode::CONFLICT, "MissingScores"),
                SettlementError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal"),
            },
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {self:?}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
                kind,
            }),
        )
            .into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InsufficientBalance {
                available,
                required,
            } => AppError::Rejected(BetRejection::InsufficientBalance {
                available,
                required,
            }),
            StoreError::AccountNotFound(id) => AppError::NotFound(format!("account {id}")),
            StoreError::GameNotFound(id) => AppError::NotFound(format!("game {id}")),
            StoreError::GameClosed(_) => AppError::Rejected(BetRejection::GameNotBettable {
                status: crate::models::GameStatus::Completed,
            }),
            StoreError::GameHasBets(id) => {
                AppError::Conflict(format!("game {id} still has pending bets"))
            }
            StoreError::Duplicate(what) => AppError::Conflict(format!("{what} already exists")),
            StoreError::Database(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Malformed | SessionError::BadSignature | SessionError::Expired => {
                AppError::Unauthorized
            }
            other => AppError::Internal(other.into()),
        }
    }
}
