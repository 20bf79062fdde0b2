//! Human-verification challenge.
//!
//! The orchestrator suspends on [`ChallengePresenter::present`] until the
//! widget reports one of its callbacks. [`ChallengeBridge`] implements the
//! presenter by serving the widget page on the local bridge router and
//! waiting for the page to post the callback back.

pub mod bridge;

use async_trait::async_trait;

use crate::error::AbandonReason;
use crate::service::token::VerificationToken;

pub use bridge::ChallengeBridge;

/// How a presented challenge ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// `onVerified(token)`.
    Verified(VerificationToken),
    /// `onError(message)`.
    Error(String),
    /// `onExpire()`.
    Expired,
    /// Closed without any widget callback.
    Cancelled,
}

impl ChallengeOutcome {
    /// Label used for metrics and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Verified(_) => "verified",
            Self::Error(_) => "error",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    /// Why the challenge was abandoned, or `None` if it produced a token.
    #[must_use]
    pub fn abandon_reason(&self) -> Option<AbandonReason> {
        match self {
            Self::Verified(_) => None,
            Self::Error(message) => Some(AbandonReason::WidgetError(message.clone())),
            Self::Expired => Some(AbandonReason::Expired),
            Self::Cancelled => Some(AbandonReason::Cancelled),
        }
    }
}

/// Presents the challenge widget and waits for its first callback.
#[async_trait]
pub trait ChallengePresenter: Send + Sync {
    /// Show the widget and resolve with the first callback it fires.
    async fn present(&self) -> ChallengeOutcome;
}

/// Presenter used when no bridge is running: every challenge is cancelled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChallenge;

#[async_trait]
impl ChallengePresenter for NoChallenge {
    async fn present(&self) -> ChallengeOutcome {
        tracing::warn!("Verification required but the challenge bridge is disabled");
        ChallengeOutcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abandon_reasons() {
        assert_eq!(
            ChallengeOutcome::Verified("tok".into()).abandon_reason(),
            None
        );
        assert_eq!(
            ChallengeOutcome::Error("script failed".to_string()).abandon_reason(),
            Some(AbandonReason::WidgetError("script failed".to_string()))
        );
        assert_eq!(
            ChallengeOutcome::Expired.abandon_reason(),
            Some(AbandonReason::Expired)
        );
        assert_eq!(ChallengeOutcome::Cancelled.as_str(), "cancelled");
    }

    #[tokio::test]
    async fn test_no_challenge_cancels() {
        assert_eq!(NoChallenge.present().await, ChallengeOutcome::Cancelled);
    }
}
