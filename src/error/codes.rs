//! Error code constants.
//!
//! Two families live here:
//! - [`ServiceCode`]: the string codes the generation service puts in failed
//!   response bodies. These drive failure classification.
//! - [`ErrorCode`]: numeric codes used in the envelope of the local challenge
//!   bridge, organized by category:
//!   - 3xxx: Validation errors
//!   - 4xxx: Resource errors
//!   - 5xxx: Internal/System errors

/// Service-defined failure code carried in the `code` field of an error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceCode {
    /// No verification token was presented.
    TurnstileRequired,
    /// A token was presented but rejected (expired, wrong, reused).
    InvalidTurnstile,
    /// Service-wide throughput cap exceeded.
    GlobalRateLimit,
    /// Per-client cooldown window not yet elapsed.
    IpRateLimit,
}

impl ServiceCode {
    /// Parse a wire code. Unknown codes yield `None`.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "TURNSTILE_REQUIRED" => Some(Self::TurnstileRequired),
            "INVALID_TURNSTILE" => Some(Self::InvalidTurnstile),
            "GLOBAL_RATE_LIMIT" => Some(Self::GlobalRateLimit),
            "IP_RATE_LIMIT" => Some(Self::IpRateLimit),
            _ => None,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TurnstileRequired => "TURNSTILE_REQUIRED",
            Self::InvalidTurnstile => "INVALID_TURNSTILE",
            Self::GlobalRateLimit => "GLOBAL_RATE_LIMIT",
            Self::IpRateLimit => "IP_RATE_LIMIT",
        }
    }

    /// Get the category of this code.
    #[must_use]
    pub const fn category(self) -> ServiceCodeCategory {
        match self {
            Self::TurnstileRequired | Self::InvalidTurnstile => ServiceCodeCategory::Verification,
            Self::GlobalRateLimit | Self::IpRateLimit => ServiceCodeCategory::RateLimit,
        }
    }
}

impl std::fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gating mechanism a service code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCodeCategory {
    /// Human-verification challenge.
    Verification,
    /// Global or per-client rate limiting.
    RateLimit,
}

/// Numeric error code used by the challenge bridge envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(i32);

impl ErrorCode {
    // ===== Validation Errors (3xxx) =====

    /// Bad request / invalid parameters.
    pub const BAD_REQUEST: Self = Self(3001);

    /// Missing required parameter.
    pub const MISSING_PARAM: Self = Self(3002);

    // ===== Resource Errors (4xxx) =====

    /// Challenge session unknown or already resolved.
    pub const SESSION_NOT_FOUND: Self = Self(4001);

    // ===== Internal/System Errors (5xxx) =====

    /// Internal error.
    pub const INTERNAL_ERROR: Self = Self(5002);

    /// Get the error code as an i32.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_codes() {
        for code in [
            ServiceCode::TurnstileRequired,
            ServiceCode::InvalidTurnstile,
            ServiceCode::GlobalRateLimit,
            ServiceCode::IpRateLimit,
        ] {
            assert_eq!(ServiceCode::parse(code.as_str()), Some(code));
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(ServiceCode::parse("turnstile_required"), None);
        assert_eq!(ServiceCode::parse(""), None);
        assert_eq!(ServiceCode::parse("QUOTA_EXCEEDED"), None);
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ServiceCode::InvalidTurnstile.category(),
            ServiceCodeCategory::Verification
        );
        assert_eq!(
            ServiceCode::IpRateLimit.category(),
            ServiceCodeCategory::RateLimit
        );
    }

    #[test]
    fn test_bridge_error_code_values() {
        assert_eq!(ErrorCode::BAD_REQUEST.as_i32(), 3001);
        assert_eq!(ErrorCode::SESSION_NOT_FOUND.as_i32(), 4001);
        assert_eq!(i32::from(ErrorCode::INTERNAL_ERROR), 5002);
    }
}
