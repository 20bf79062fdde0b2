//! Application state for Axum handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::challenge::ChallengeBridge;

/// Shared bridge state.
#[derive(Clone)]
pub struct AppState {
    /// Pending challenge sessions.
    pub bridge: Arc<ChallengeBridge>,
    /// Prometheus recorder handle, when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state.
    pub const fn new(bridge: Arc<ChallengeBridge>, metrics: Option<PrometheusHandle>) -> Self {
        Self { bridge, metrics }
    }
}
