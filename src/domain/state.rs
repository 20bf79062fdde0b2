//! Orchestration state machine types.

use serde::{Deserialize, Serialize};

use crate::error::FailureKind;

/// Which rate limiter rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitScope {
    /// Service-wide throughput cap.
    Global,
    /// Per-client cooldown window.
    Client,
}

impl std::fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Client => write!(f, "client"),
        }
    }
}

/// State of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationState {
    /// Nothing pending.
    Idle,
    /// An exchange with the service is outstanding.
    InFlight,
    /// Suspended until the challenge widget reports back.
    AwaitingVerification,
    /// The run ended with the given failure.
    Failed(FailureKind),
}

impl OrchestrationState {
    /// Whether a transition from `self` to `next` is part of the protocol.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle | Self::Failed(_), Self::InFlight)
                | (
                    Self::InFlight,
                    Self::Idle | Self::AwaitingVerification | Self::Failed(_)
                )
                | (
                    Self::AwaitingVerification,
                    Self::InFlight | Self::Idle | Self::Failed(_)
                )
        )
    }

    /// Whether the run is still pending.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::InFlight | Self::AwaitingVerification)
    }
}

impl std::fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::InFlight => write!(f, "in_flight"),
            Self::AwaitingVerification => write!(f, "awaiting_verification"),
            Self::Failed(kind) => write!(f, "failed({kind})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_transitions() {
        use OrchestrationState::{AwaitingVerification, Failed, Idle, InFlight};

        assert!(Idle.can_transition_to(InFlight));
        assert!(InFlight.can_transition_to(AwaitingVerification));
        assert!(AwaitingVerification.can_transition_to(InFlight));
        assert!(InFlight.can_transition_to(Failed(FailureKind::Network)));
        assert!(AwaitingVerification.can_transition_to(Idle));

        assert!(!Idle.can_transition_to(AwaitingVerification));
        assert!(!Idle.can_transition_to(Idle));
        assert!(!AwaitingVerification.can_transition_to(AwaitingVerification));
    }

    #[test]
    fn test_display() {
        assert_eq!(OrchestrationState::InFlight.to_string(), "in_flight");
        assert_eq!(
            OrchestrationState::Failed(FailureKind::RateLimited(RateLimitScope::Global))
                .to_string(),
            "failed(rate_limited_global)"
        );
        assert_eq!(RateLimitScope::Client.to_string(), "client");
    }
}
