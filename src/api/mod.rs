//! API layer module.
//!
//! The local challenge bridge: health and metrics endpoints plus the
//! verification widget page and its callbacks.

pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
