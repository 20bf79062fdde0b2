//! Session bridge between the orchestrator and the widget page.
//!
//! Each [`present`](ChallengePresenter::present) call opens a fresh session
//! keyed by a random UUID and parks on a oneshot channel. The widget page's
//! callbacks resolve the session through [`ChallengeBridge::resolve`]; the
//! first callback wins and removes the session, so a late or replayed callback
//! finds nothing and cannot leak a token into a later challenge.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::challenge::{ChallengeOutcome, ChallengePresenter};
use crate::error::BridgeError;

/// Pending challenge sessions, served by the bridge router.
pub struct ChallengeBridge {
    sessions: DashMap<Uuid, oneshot::Sender<ChallengeOutcome>>,
    site_key: String,
    public_base: Url,
}

impl ChallengeBridge {
    /// Create a bridge whose pages are reachable under `public_base`.
    pub fn new(site_key: impl Into<String>, public_base: Url) -> Self {
        Self {
            sessions: DashMap::new(),
            site_key: site_key.into(),
            public_base,
        }
    }

    /// Public site key rendered into the widget page.
    #[must_use]
    pub fn site_key(&self) -> &str {
        &self.site_key
    }

    /// Number of sessions waiting for a callback.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.sessions.len()
    }

    /// Whether `session` is waiting for a callback.
    #[must_use]
    pub fn is_pending(&self, session: &Uuid) -> bool {
        self.sessions.contains_key(session)
    }

    /// Ids of the sessions waiting for a callback.
    #[must_use]
    pub fn pending_sessions(&self) -> Vec<Uuid> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// URL of the widget page for `session`.
    #[must_use]
    pub fn session_url(&self, session: &Uuid) -> String {
        self.public_base
            .join(&format!("challenge/{session}"))
            .map_or_else(|_| format!("{}challenge/{session}", self.public_base), String::from)
    }

    /// Open a new session and return its id with the receiving end.
    pub fn open(&self) -> (Uuid, oneshot::Receiver<ChallengeOutcome>) {
        let session = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.sessions.insert(session, tx);
        debug!(%session, "Challenge session opened");
        (session, rx)
    }

    /// Deliver the first callback for `session`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SessionNotFound`] if the session is unknown or
    /// already resolved.
    pub fn resolve(&self, session: &Uuid, outcome: ChallengeOutcome) -> Result<(), BridgeError> {
        let Some((_, tx)) = self.sessions.remove(session) else {
            return Err(BridgeError::SessionNotFound(session.to_string()));
        };

        let label = outcome.as_str();
        metrics::counter!("imagegen_challenge_total", "outcome" => label).increment(1);

        if tx.send(outcome).is_err() {
            // The waiting orchestration was dropped in the meantime
            warn!(%session, outcome = label, "Challenge resolved after its waiter went away");
        } else {
            info!(%session, outcome = label, "Challenge resolved");
        }
        Ok(())
    }

    /// Cancel every pending session, e.g. on shutdown.
    pub fn cancel_all(&self) {
        for session in self.pending_sessions() {
            // Raced with a callback: already resolved, nothing to do
            let _ = self.resolve(&session, ChallengeOutcome::Cancelled);
        }
    }
}

/// Removes the session if the waiting future is dropped before resolution.
struct SessionGuard<'a> {
    sessions: &'a DashMap<Uuid, oneshot::Sender<ChallengeOutcome>>,
    session: Uuid,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.sessions.remove(&self.session);
    }
}

#[async_trait]
impl ChallengePresenter for ChallengeBridge {
    async fn present(&self) -> ChallengeOutcome {
        let (session, rx) = self.open();
        let _guard = SessionGuard {
            sessions: &self.sessions,
            session,
        };

        info!(
            %session,
            url = %self.session_url(&session),
            "Verification required, open the challenge page to continue"
        );

        rx.await.unwrap_or(ChallengeOutcome::Cancelled)
    }
}
