//! HTTP handlers.

pub mod challenge;
pub mod health;
