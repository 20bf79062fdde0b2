//! # imagegen-client
//!
//! Client for an image generation service that sits behind rate limiting and
//! human verification.
//!
//! - **Orchestrator**: submits generate requests, classifies failures, and on a
//!   verification failure presents the challenge and resubmits the same
//!   request once
//! - **Identifier ledger**: capped, durable, newest-first list of generated ids
//! - **History pager**: pages the ledger and batch-looks-up the records
//! - **Challenge bridge**: local HTTP page hosting the verification widget
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                              imagegen                                │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐   ┌──────────────┐   ┌─────────────┐   ┌─────────────┐  │
//! │  │   CLI   │ → │   Service    │ → │  Transport  │ → │ remote API  │  │
//! │  │ (clap)  │   │    Layer     │   │  (reqwest)  │   └─────────────┘  │
//! │  └─────────┘   └──────────────┘   └─────────────┘                    │
//! │                  │          │                                        │
//! │                  ▼          ▼                                        │
//! │          ┌──────────┐  ┌──────────────┐                              │
//! │          │ Storage  │  │  Challenge   │ ← widget callbacks (Axum)    │
//! │          └──────────┘  │    Bridge    │                              │
//! │                        └──────────────┘                              │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod api;
pub mod challenge;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod storage;
pub mod transport;

use std::sync::Arc;

use clap::Parser;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use url::Url;

use crate::api::{AppState, create_router};
use crate::challenge::{ChallengeBridge, ChallengePresenter, NoChallenge};
use crate::cli::Cli;
use crate::client::Client;
use crate::config::{AppConfig, ChallengeConfig};
use crate::storage::create_store;
use crate::transport::{HttpTransport, ServiceTransport};

/// Run the imagegen client.
///
/// This function:
/// 1. Parses the command line and loads configuration
/// 2. Initializes logging, metrics and the storage backend
/// 3. Starts the challenge bridge when the command may need verification
/// 4. Executes the command, stopping early on Ctrl+C
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded
/// - Storage backend fails to initialize
/// - The challenge bridge fails to bind
/// - The command fails
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.service.base_url,
        "Starting imagegen client"
    );

    let metrics = if config.observability.metrics_enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    let store = create_store(&config.storage).await?;
    info!(backend = %config.storage.backend, "Storage initialized");

    let transport: Arc<dyn ServiceTransport> = Arc::new(HttpTransport::new(&config.service)?);

    let bridge = if cli.needs_challenge() && config.challenge.enabled {
        Some(BridgeServer::start(&config.challenge, metrics).await?)
    } else {
        None
    };
    let challenge: Arc<dyn ChallengePresenter> = match &bridge {
        Some(server) => server.bridge.clone(),
        None => Arc::new(NoChallenge),
    };

    let client = Client::new(&config, store, transport, challenge);

    let result = tokio::select! {
        result = cli.execute(&client) => result,
        () = shutdown_signal() => Err(anyhow::anyhow!("interrupted")),
    };

    if let Some(server) = bridge {
        server.stop().await;
    }

    result
}

/// Running challenge bridge.
struct BridgeServer {
    bridge: Arc<ChallengeBridge>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl BridgeServer {
    async fn start(
        config: &ChallengeConfig,
        metrics: Option<PrometheusHandle>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.addr()).await?;
        let addr = listener.local_addr()?;
        let public_base = Url::parse(&format!("http://{addr}/"))?;

        let bridge = Arc::new(ChallengeBridge::new(&*config.site_key, public_base));
        let app = create_router(AppState::new(Arc::clone(&bridge), metrics));
        info!(%addr, "Challenge bridge listening");

        let (shutdown, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                stopped.await.ok();
            });
            if let Err(e) = serve.await {
                warn!(error = %e, "Challenge bridge stopped with error");
            }
        });

        Ok(Self {
            bridge,
            shutdown,
            task,
        })
    }

    async fn stop(self) {
        self.bridge.cancel_all();
        // The server task may already have exited
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            warn!(error = %e, "Challenge bridge task failed");
        }
        info!("Challenge bridge shutdown complete");
    }
}

/// Initialize logging based on configuration.
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_logging(config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.observability.log_format == "json" {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            warn!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            warn!("Received SIGTERM, shutting down");
        }
    }
}
