//! API error mapping: engine errors to HTTP status codes and structured
//! JSON bodies, each carrying the request id for log correlation.

use crate::errors::BingoError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire shape of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine code (NOT_FOUND, CONFLICT, PAYMENT_FAILED, ...).
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    /// Unknown game or player index.
    NotFound(String),
    /// Duplicate ids/joins or operations illegal in the current state.
    Conflict(String),
    /// The token collaborator rejected a transfer.
    PaymentFailed(String),
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::BadRequest(message),
            request_id,
        }
    }

    pub fn internal(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::Internal(message),
            request_id,
        }
    }

    /// Map an engine failure onto the HTTP taxonomy.
    pub fn from_engine(request_id: String, err: BingoError) -> Self {
        let kind = match &err {
            BingoError::GameNotFound(_) | BingoError::PlayerNotFound { .. } => {
                ApiErrorKind::NotFound(err.to_string())
            }
            BingoError::GameAlreadyExists(_)
            | BingoError::AlreadyJoined { .. }
            | BingoError::GameSettled(_)
            | BingoError::JoinClosed(_)
            | BingoError::UniverseExhausted(_) => ApiErrorKind::Conflict(err.to_string()),
            BingoError::Transfer(_) => ApiErrorKind::PaymentFailed(err.to_string()),
            BingoError::Config(_) => ApiErrorKind::Internal(err.to_string()),
        };
        Self { kind, request_id }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ApiErrorKind::NotFound(msg) => write!(f, "[{}] not found: {}", self.request_id, msg),
            ApiErrorKind::Conflict(msg) => write!(f, "[{}] conflict: {}", self.request_id, msg),
            ApiErrorKind::PaymentFailed(msg) => {
                write!(f, "[{}] payment failed: {}", self.request_id, msg)
            }
            ApiErrorKind::BadRequest(msg) => {
                write!(f, "[{}] bad request: {}", self.request_id, msg)
            }
            ApiErrorKind::Internal(msg) => write!(f, "[{}] internal: {}", self.request_id, msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self.kind {
            ApiErrorKind::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiErrorKind::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiErrorKind::PaymentFailed(msg) => {
                (StatusCode::PAYMENT_REQUIRED, "PAYMENT_FAILED", msg.clone())
            }
            ApiErrorKind::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiErrorKind::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = ErrorResponse {
            request_id: self.request_id,
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenError;

    fn kind_of(err: BingoError) -> ApiErrorKind {
        ApiError::from_engine("req-1".to_string(), err).kind
    }

    #[test]
    fn test_engine_error_mapping() {
        assert!(matches!(kind_of(BingoError::GameNotFound(1)), ApiErrorKind::NotFound(_)));
        assert!(matches!(
            kind_of(BingoError::PlayerNotFound { game_id: 1, index: 3 }),
            ApiErrorKind::NotFound(_)
        ));
        assert!(matches!(
            kind_of(BingoError::GameAlreadyExists(1)),
            ApiErrorKind::Conflict(_)
        ));
        assert!(matches!(kind_of(BingoError::GameSettled(1)), ApiErrorKind::Conflict(_)));
        assert!(matches!(
            kind_of(BingoError::UniverseExhausted(1)),
            ApiErrorKind::Conflict(_)
        ));
        assert!(matches!(
            kind_of(BingoError::Transfer(TokenError::InsufficientBalance("a".into()))),
            ApiErrorKind::PaymentFailed(_)
        ));
    }

    #[test]
    fn test_display_includes_request_id() {
        let err = ApiError::from_engine("req-42".to_string(), BingoError::GameNotFound(9));
        assert!(err.to_string().contains("req-42"));
        assert!(err.to_string().contains("game 9"));
    }

    #[test]
    fn test_error_response_wire_shape() {
        let body = ErrorResponse {
            request_id: "req-7".to_string(),
            error: ErrorBody {
                code: "NOT_FOUND".to_string(),
                message: "game 7 does not exist".to_string(),
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["request_id"], "req-7");
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "game 7 does not exist");
    }
}
