//! Failure classification.
//!
//! Turns a failed exchange into exactly one [`GenerationFailure`]. The service
//! code in the body is authoritative; the HTTP status only shows up in the
//! fallback message when the body says nothing useful. Classification is pure:
//! deciding what to do with a verification failure is the orchestrator's job.

use crate::domain::{ErrorBody, RateLimitScope};
use crate::error::{GenerationFailure, ServiceCode};

/// A completed exchange that came back with a non-success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedExchange {
    /// HTTP status.
    pub status: u16,
    /// Service-defined code, if the body carried one.
    pub code: Option<String>,
    /// Service message, if the body carried one.
    pub message: Option<String>,
}

impl FailedExchange {
    /// Build from a status and raw body. Unparseable bodies carry neither code
    /// nor message; a malformed `error` field does not hide the code.
    #[must_use]
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let parsed = ErrorBody::from_slice_lenient(body);
        Self {
            status,
            code: parsed.code,
            message: parsed.error,
        }
    }

    /// Message to surface: the service's own, or a status-based fallback.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => format!("HTTP error! status: {}", self.status),
        }
    }
}

/// Classify a failed exchange.
#[must_use]
pub fn classify(failed: &FailedExchange) -> GenerationFailure {
    let message = failed.display_message();

    match failed.code.as_deref().and_then(ServiceCode::parse) {
        Some(ServiceCode::TurnstileRequired) => GenerationFailure::VerificationRequired(message),
        Some(ServiceCode::InvalidTurnstile) => GenerationFailure::VerificationRejected(message),
        Some(ServiceCode::GlobalRateLimit) => GenerationFailure::RateLimited {
            scope: RateLimitScope::Global,
            message,
        },
        Some(ServiceCode::IpRateLimit) => GenerationFailure::RateLimited {
            scope: RateLimitScope::Client,
            message,
        },
        None => GenerationFailure::GenericFailure(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(status: u16, body: &str) -> FailedExchange {
        FailedExchange::from_body(status, body.as_bytes())
    }

    #[test]
    fn test_verification_codes() {
        assert_eq!(
            classify(&failed(
                401,
                r#"{"error":"Turnstile verification required","code":"TURNSTILE_REQUIRED"}"#
            )),
            GenerationFailure::VerificationRequired("Turnstile verification required".to_string())
        );
        assert!(matches!(
            classify(&failed(401, r#"{"error":"bad token","code":"INVALID_TURNSTILE"}"#)),
            GenerationFailure::VerificationRejected(_)
        ));
    }

    #[test]
    fn test_rate_limit_scopes() {
        assert_eq!(
            classify(&failed(429, r#"{"error":"busy","code":"GLOBAL_RATE_LIMIT"}"#)),
            GenerationFailure::RateLimited {
                scope: RateLimitScope::Global,
                message: "busy".to_string()
            }
        );
        assert_eq!(
            classify(&failed(429, r#"{"error":"wait","code":"IP_RATE_LIMIT"}"#)).kind(),
            crate::error::FailureKind::RateLimited(RateLimitScope::Client)
        );
    }

    #[test]
    fn test_code_is_authoritative_over_status() {
        // A rate-limit code on a 500 is still a rate limit
        assert!(matches!(
            classify(&failed(500, r#"{"error":"x","code":"IP_RATE_LIMIT"}"#)),
            GenerationFailure::RateLimited {
                scope: RateLimitScope::Client,
                ..
            }
        ));
        // A 429 without a code is generic
        assert!(matches!(
            classify(&failed(429, r#"{"error":"too many"}"#)),
            GenerationFailure::GenericFailure(_)
        ));
    }

    #[test]
    fn test_unknown_code_passes_message_through() {
        assert_eq!(
            classify(&failed(500, r#"{"error":"Failed to generate image","code":"NOVELAI_DOWN"}"#)),
            GenerationFailure::GenericFailure("Failed to generate image".to_string())
        );
    }

    #[test]
    fn test_unparseable_body_falls_back_to_status() {
        assert_eq!(
            classify(&failed(502, "<html>Bad Gateway</html>")),
            GenerationFailure::GenericFailure("HTTP error! status: 502".to_string())
        );
        assert_eq!(
            classify(&failed(500, "")),
            GenerationFailure::GenericFailure("HTTP error! status: 500".to_string())
        );
    }

    #[test]
    fn test_code_survives_non_string_error_field() {
        assert_eq!(
            classify(&failed(
                429,
                r#"{"error":{"detail":"slow down"},"code":"IP_RATE_LIMIT"}"#
            )),
            GenerationFailure::RateLimited {
                scope: RateLimitScope::Client,
                message: "HTTP error! status: 429".to_string()
            }
        );
        assert!(matches!(
            classify(&failed(401, r#"{"error":["bad"],"code":"INVALID_TURNSTILE"}"#)),
            GenerationFailure::VerificationRejected(_)
        ));
    }

    #[test]
    fn test_missing_message_with_known_code() {
        assert_eq!(
            classify(&failed(403, r#"{"code":"TURNSTILE_REQUIRED"}"#)),
            GenerationFailure::VerificationRequired("HTTP error! status: 403".to_string())
        );
    }
}
