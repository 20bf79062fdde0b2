//! Service layer module.
//!
//! Client-side orchestration of generate actions and history lookups.

pub mod classifier;
pub mod ledger;
pub mod orchestrator;
pub mod pager;
pub mod privilege;
pub mod token;

pub use classifier::{FailedExchange, classify};
pub use ledger::{IdentifierLedger, LEDGER_CAPACITY, LEDGER_KEY};
pub use orchestrator::{Orchestrator, StateObserver};
pub use pager::{HistoryPage, HistoryPager};
pub use privilege::{PRIVILEGE_KEY, PrivilegeKeyStore};
pub use token::{VerificationToken, VerificationTokenHolder};
