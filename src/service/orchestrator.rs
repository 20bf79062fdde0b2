//! Request orchestrator.
//!
//! Drives one generate action through its state machine:
//!
//! ```text
//!   Idle ──submit──▶ InFlight ──success──▶ Idle
//!                      │  ▲
//!   verification needed│  │verified (once)
//!                      ▼  │
//!              AwaitingVerification ──error/expire/cancel──▶ Failed
//!
//!   InFlight ──rate limit / generic / network──▶ Failed
//! ```
//!
//! The request value is retained across the challenge so the resubmission is
//! the identical request. Verification recovery happens at most once per
//! action; a second verification failure is surfaced to the caller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::challenge::{ChallengeOutcome, ChallengePresenter};
use crate::domain::{GenerationRequest, GenerationResult, OrchestrationState};
use crate::error::{AbandonReason, GenerationFailure, GenerationOutcome};
use crate::service::classifier::classify;
use crate::service::ledger::IdentifierLedger;
use crate::service::privilege::PrivilegeKeyStore;
use crate::service::token::VerificationTokenHolder;
use crate::transport::{Credentials, ExchangeError, ServiceTransport};

/// Receives every state transition of an orchestration run.
pub trait StateObserver: Send {
    fn on_transition(&mut self, from: OrchestrationState, to: OrchestrationState);
}

impl<F> StateObserver for F
where
    F: FnMut(OrchestrationState, OrchestrationState) + Send,
{
    fn on_transition(&mut self, from: OrchestrationState, to: OrchestrationState) {
        self(from, to);
    }
}

struct NoopObserver;

impl StateObserver for NoopObserver {
    fn on_transition(&mut self, _from: OrchestrationState, _to: OrchestrationState) {}
}

/// Per-call state tracker.
struct Run<'a> {
    state: OrchestrationState,
    observer: &'a mut dyn StateObserver,
}

impl Run<'_> {
    fn transition(&mut self, next: OrchestrationState) {
        let from = self.state;
        debug_assert!(
            from.can_transition_to(next),
            "illegal transition {from} -> {next}"
        );
        debug!(%from, to = %next, "Orchestration transition");
        self.state = next;
        self.observer.on_transition(from, next);
    }

    fn fail(&mut self, failure: GenerationFailure) -> GenerationFailure {
        self.transition(OrchestrationState::Failed(failure.kind()));
        failure
    }
}

/// Coordinates transport, token holder, challenge and ledger for generate
/// actions.
pub struct Orchestrator {
    transport: Arc<dyn ServiceTransport>,
    tokens: Arc<VerificationTokenHolder>,
    ledger: Arc<IdentifierLedger>,
    challenge: Arc<dyn ChallengePresenter>,
    privilege: Arc<PrivilegeKeyStore>,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn ServiceTransport>,
        tokens: Arc<VerificationTokenHolder>,
        ledger: Arc<IdentifierLedger>,
        challenge: Arc<dyn ChallengePresenter>,
        privilege: Arc<PrivilegeKeyStore>,
    ) -> Self {
        Self {
            transport,
            tokens,
            ledger,
            challenge,
            privilege,
        }
    }

    /// Token holder shared with this orchestrator.
    #[must_use]
    pub fn tokens(&self) -> &Arc<VerificationTokenHolder> {
        &self.tokens
    }

    /// Run one generate action to completion.
    ///
    /// # Errors
    ///
    /// Returns the [`GenerationFailure`] the action ended in.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> GenerationOutcome<GenerationResult> {
        self.generate_observed(request, &mut NoopObserver).await
    }

    /// Like [`generate`](Self::generate), reporting every transition to
    /// `observer`.
    ///
    /// # Errors
    ///
    /// Returns the [`GenerationFailure`] the action ended in.
    pub async fn generate_observed(
        &self,
        request: GenerationRequest,
        observer: &mut dyn StateObserver,
    ) -> GenerationOutcome<GenerationResult> {
        let mut run = Run {
            state: OrchestrationState::Idle,
            observer,
        };

        let outcome = self.drive(&request, &mut run).await;

        let label = match &outcome {
            Ok(_) => "success",
            Err(failure) => failure.kind().as_str(),
        };
        metrics::counter!("imagegen_generate_total", "outcome" => label).increment(1);

        match &outcome {
            Ok(result) => info!(id = result.id, seed = result.seed, "Image generated"),
            Err(failure) => warn!(kind = %failure.kind(), error = %failure, "Generation failed"),
        }

        outcome
    }

    async fn drive(
        &self,
        request: &GenerationRequest,
        run: &mut Run<'_>,
    ) -> GenerationOutcome<GenerationResult> {
        if let Err(reason) = request.validate() {
            return Err(GenerationFailure::InvalidRequest(reason));
        }

        let privilege_key = match self.privilege.current().await {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Could not read privilege key, continuing without it");
                None
            }
        };

        let mut verification_retry_used = false;

        loop {
            run.transition(OrchestrationState::InFlight);

            let credentials = Credentials {
                privilege_key: privilege_key.clone(),
                verification_token: self.tokens.take(),
            };

            let failure = match self.transport.generate(request, &credentials).await {
                Ok(result) => {
                    if let Err(e) = self.ledger.record(result.id).await {
                        warn!(id = result.id, error = %e, "Failed to record image id in ledger");
                    }
                    run.transition(OrchestrationState::Idle);
                    return Ok(result);
                }
                Err(ExchangeError::Failed(failed)) => classify(&failed),
                Err(ExchangeError::Network(message) | ExchangeError::Malformed(message)) => {
                    GenerationFailure::Network(message)
                }
            };

            if !failure.needs_verification() || verification_retry_used {
                if matches!(failure, GenerationFailure::VerificationRejected(_)) {
                    self.tokens.clear();
                }
                return Err(run.fail(failure));
            }

            verification_retry_used = true;
            run.transition(OrchestrationState::AwaitingVerification);
            if matches!(failure, GenerationFailure::VerificationRejected(_)) {
                self.tokens.clear();
            }
            debug!(kind = %failure.kind(), "Presenting verification challenge");

            match self.challenge.present().await {
                ChallengeOutcome::Verified(token) => self.tokens.set(token),
                abandoned => {
                    self.tokens.clear();
                    let reason = abandoned
                        .abandon_reason()
                        .unwrap_or(AbandonReason::Cancelled);
                    return Err(run.fail(GenerationFailure::VerificationAbandoned(reason)));
                }
            }
        }
    }
}
