//! Verification token holder.
//!
//! Holds at most one human-verification token issued by the challenge widget.
//! The service treats tokens as single-use, so the orchestrator removes the
//! token with [`VerificationTokenHolder::take`] right before attaching it to an
//! outgoing exchange: whatever the exchange's outcome, the token is gone.
//!
//! Lifecycle:
//! - *acquired*: [`set`](VerificationTokenHolder::set), last write wins
//! - *consumed*: [`take`](VerificationTokenHolder::take)
//! - *invalidated*: [`clear`](VerificationTokenHolder::clear), on expiry or rejection

use parking_lot::Mutex;

/// Opaque single-use verification credential.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// Wrap a token string issued by the widget.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, as sent in the `X-Turnstile-Token` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; keep them out of logs.
impl std::fmt::Debug for VerificationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerificationToken(<{} chars>)", self.0.len())
    }
}

impl From<&str> for VerificationToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Single-slot token cache.
#[derive(Debug, Default)]
pub struct VerificationTokenHolder {
    slot: Mutex<Option<VerificationToken>>,
}

impl VerificationTokenHolder {
    /// Create an empty holder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly acquired token, replacing any held one.
    pub fn set(&self, token: VerificationToken) {
        let replaced = self.slot.lock().replace(token).is_some();
        tracing::debug!(replaced, "Verification token acquired");
    }

    /// Drop the held token, if any.
    pub fn clear(&self) {
        if self.slot.lock().take().is_some() {
            tracing::debug!("Verification token invalidated");
        }
    }

    /// Current token without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<VerificationToken> {
        self.slot.lock().clone()
    }

    /// Remove and return the held token.
    pub fn take(&self) -> Option<VerificationToken> {
        self.slot.lock().take()
    }

    /// Whether a token is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}
