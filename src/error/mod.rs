//! Error handling module.
//!
//! [`GenerationFailure`] is the closed taxonomy a generate action can end in.
//! [`BridgeError`] maps challenge-bridge failures onto HTTP responses, and
//! [`StorageError`] covers the durable key-value backends.

pub mod codes;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub use codes::{ErrorCode, ServiceCode, ServiceCodeCategory};

use crate::domain::RateLimitScope;

/// Typed failure of a generate action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationFailure {
    /// No valid verification token was presented.
    #[error("Verification required: {0}")]
    VerificationRequired(String),

    /// A token was presented but the service rejected it.
    #[error("Verification token rejected: {0}")]
    VerificationRejected(String),

    /// Service-wide or per-client rate limit hit.
    #[error("Rate limited ({scope}): {message}")]
    RateLimited {
        /// Which limiter fired.
        scope: RateLimitScope,
        /// Service message.
        message: String,
    },

    /// Any other failure reported by the service.
    #[error("{0}")]
    GenericFailure(String),

    /// The exchange could not be completed at all.
    #[error("Network failure: {0}")]
    Network(String),

    /// The challenge ended without producing a token.
    #[error("Verification abandoned: {0}")]
    VerificationAbandoned(AbandonReason),

    /// The request was refused before any exchange.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GenerationFailure {
    /// Discriminant of this failure, without payload.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::VerificationRequired(_) => FailureKind::VerificationRequired,
            Self::VerificationRejected(_) => FailureKind::VerificationRejected,
            Self::RateLimited { scope, .. } => FailureKind::RateLimited(*scope),
            Self::GenericFailure(_) => FailureKind::GenericFailure,
            Self::Network(_) => FailureKind::Network,
            Self::VerificationAbandoned(_) => FailureKind::VerificationAbandoned,
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
        }
    }

    /// Whether the orchestrator may recover this failure by running the challenge.
    #[must_use]
    pub const fn needs_verification(&self) -> bool {
        matches!(
            self,
            Self::VerificationRequired(_) | Self::VerificationRejected(_)
        )
    }
}

/// Payload-free discriminant of [`GenerationFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    VerificationRequired,
    VerificationRejected,
    RateLimited(RateLimitScope),
    GenericFailure,
    Network,
    VerificationAbandoned,
    InvalidRequest,
}

impl FailureKind {
    /// Label used for metrics and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VerificationRequired => "verification_required",
            Self::VerificationRejected => "verification_rejected",
            Self::RateLimited(RateLimitScope::Global) => "rate_limited_global",
            Self::RateLimited(RateLimitScope::Client) => "rate_limited_client",
            Self::GenericFailure => "generic_failure",
            Self::Network => "network",
            Self::VerificationAbandoned => "verification_abandoned",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a challenge ended without a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbandonReason {
    /// The widget reported an error.
    #[error("challenge widget error: {0}")]
    WidgetError(String),

    /// The widget's token expired before it could be used.
    #[error("challenge expired")]
    Expired,

    /// The challenge was closed without completing it.
    #[error("challenge cancelled")]
    Cancelled,
}

/// Challenge bridge error, rendered as an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Session unknown, or already resolved by an earlier callback.
    #[error("Challenge session not found: {0}")]
    SessionNotFound(String),

    /// Required field missing from the callback.
    #[error("Missing parameter: {0}")]
    MissingParam(&'static str),

    /// Malformed request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::SessionNotFound(_) => ErrorCode::SESSION_NOT_FOUND,
            Self::MissingParam(_) => ErrorCode::MISSING_PARAM,
            Self::BadRequest(_) => ErrorCode::BAD_REQUEST,
            Self::Internal(_) => ErrorCode::INTERNAL_ERROR,
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingParam(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().as_i32();
        let message = self.to_string();

        tracing::warn!(
            error_code = code,
            status = %status,
            message = %message,
            "Challenge callback rejected"
        );

        let body = Json(json!({
            "code": code,
            "message": message,
            "data": null
        }));

        (status, body).into_response()
    }
}

/// Storage-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Lock acquisition failed.
    #[error("Failed to acquire lock: {0}")]
    LockFailed(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIO(String),

    /// Backend not available.
    #[error("Storage backend unavailable")]
    Unavailable,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::FileIO(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// History lookup error.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The ledger could not be read.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The batch lookup failed.
    #[error("Image lookup failed: {0}")]
    Lookup(#[from] crate::transport::ExchangeError),
}

/// Result type alias for generate actions.
pub type GenerationOutcome<T> = std::result::Result<T, GenerationFailure>;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        assert_eq!(
            GenerationFailure::RateLimited {
                scope: RateLimitScope::Client,
                message: "slow down".to_string(),
            }
            .kind(),
            FailureKind::RateLimited(RateLimitScope::Client)
        );
        assert_eq!(
            GenerationFailure::Network("reset".to_string()).kind(),
            FailureKind::Network
        );
        assert_eq!(
            GenerationFailure::VerificationAbandoned(AbandonReason::Expired)
                .kind()
                .as_str(),
            "verification_abandoned"
        );
    }

    #[test]
    fn test_needs_verification() {
        assert!(GenerationFailure::VerificationRequired(String::new()).needs_verification());
        assert!(GenerationFailure::VerificationRejected(String::new()).needs_verification());
        assert!(!GenerationFailure::GenericFailure(String::new()).needs_verification());
        assert!(
            !GenerationFailure::VerificationAbandoned(AbandonReason::Cancelled)
                .needs_verification()
        );
    }

    #[test]
    fn test_generic_failure_displays_message_verbatim() {
        let failure = GenerationFailure::GenericFailure("Failed to generate image".to_string());
        assert_eq!(failure.to_string(), "Failed to generate image");
    }

    #[test]
    fn test_bridge_status_codes() {
        assert_eq!(
            BridgeError::SessionNotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BridgeError::MissingParam("token").error_code(),
            ErrorCode::MISSING_PARAM
        );
        assert_eq!(
            BridgeError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
