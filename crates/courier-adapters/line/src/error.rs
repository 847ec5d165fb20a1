//! Error types for the LINE adapter.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use courier_core::SubmitError;
use thiserror::Error;
use tracing::{error, warn};

/// Why a webhook signature was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("no channel secret configured")]
    NoSecret,

    #[error("signature header is missing or not ASCII")]
    Missing,

    #[error("signature is not valid base64")]
    Malformed,

    #[error("signature does not match payload")]
    Mismatch,
}

/// The webhook body could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid webhook payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the webhook endpoint.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed to submit event: {0}")]
    Submit(#[from] SubmitError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Signature(e) => {
                warn!(error = %e, "Rejected LINE webhook");
                StatusCode::BAD_REQUEST
            }
            Self::Decode(e) => {
                warn!(error = %e, "Rejected LINE webhook");
                StatusCode::BAD_REQUEST
            }
            Self::Submit(e) => {
                error!(error = %e, "Failed to accept LINE webhook");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

pub type WebhookResult<T> = Result<T, WebhookError>;
