//! Wiring of the client components.

use std::sync::Arc;

use crate::challenge::ChallengePresenter;
use crate::config::{AppConfig, HistoryConfig};
use crate::service::{
    HistoryPager, IdentifierLedger, Orchestrator, PrivilegeKeyStore, VerificationTokenHolder,
};
use crate::storage::KeyValueStore;
use crate::transport::ServiceTransport;

/// All client components, sharing one store and one transport.
pub struct Client {
    pub orchestrator: Orchestrator,
    pub pager: HistoryPager,
    pub transport: Arc<dyn ServiceTransport>,
    pub ledger: Arc<IdentifierLedger>,
    pub privilege: Arc<PrivilegeKeyStore>,
    pub history: HistoryConfig,
}

impl Client {
    /// Wire the components together.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn ServiceTransport>,
        challenge: Arc<dyn ChallengePresenter>,
    ) -> Self {
        let ledger = Arc::new(IdentifierLedger::new(Arc::clone(&store)));
        let privilege = Arc::new(PrivilegeKeyStore::new(
            store,
            config.service.privilege_key.clone(),
        ));
        let tokens = Arc::new(VerificationTokenHolder::new());

        let orchestrator = Orchestrator::new(
            Arc::clone(&transport),
            tokens,
            Arc::clone(&ledger),
            challenge,
            Arc::clone(&privilege),
        );
        let pager = HistoryPager::new(Arc::clone(&transport), Arc::clone(&ledger));

        Self {
            orchestrator,
            pager,
            transport,
            ledger,
            privilege,
            history: config.history.clone(),
        }
    }
}
