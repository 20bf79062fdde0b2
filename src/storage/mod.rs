//! Storage layer module.
//!
//! Trait-based durable key-value storage, so the ledger and the privilege key
//! store work the same over files or memory.

pub mod factory;
pub mod file;
pub mod memory;
pub mod traits;

pub use factory::create_store;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{KeyValueStore, Updater, updater};
