//! HTTP server for the habitat.
//!
//! Provides [`serve`], which wires the streams, seed registry and persona brain into an
//! axum [`router`], and the shared [`AppState`] the handlers run against.

mod error;
mod handlers;

pub use error::ApiError;

use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;

use crate::completion;
use crate::config::HabitatConfig;
use crate::persona::{Brain, Streams};
use crate::seed::SeedRegistry;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HabitatConfig>,
    pub streams: Arc<Streams>,
    pub seeds: Arc<SeedRegistry>,
    pub brain: Arc<Brain>,
}

impl AppState {
    pub fn new(config: HabitatConfig, streams: Streams, brain: Brain) -> Self {
        Self {
            config: Arc::new(config),
            streams: Arc::new(streams),
            seeds: Arc::new(SeedRegistry::new()),
            brain: Arc::new(brain),
        }
    }

    /// Streams from the configured paths, completion service from `[completion]`.
    pub fn from_config(config: HabitatConfig) -> Self {
        let streams = Streams::from_config(&config);
        let service = completion::create_service(&config).map(Arc::from);
        let brain = Brain::new(service, config.personas.clone(), config.chat.max_turns);
        Self::new(config, streams, brain)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/status", get(handlers::status))
        .route("/echo/handshake", post(handlers::handshake))
        .route("/memory/search", get(handlers::search))
        .route("/memory/snapshot", get(handlers::snapshot))
        .route("/{persona}/import", post(handlers::import_seed))
        .route("/{persona}/state", get(handlers::seed_state))
        .route("/{persona}/memory/tail", get(handlers::memory_tail))
        .route("/{persona}/log", post(handlers::log_entry))
        .route("/{persona}/chat", post(handlers::chat))
        .with_state(state)
}

/// Start the HTTP server on the configured host and port.
pub async fn serve(config: HabitatConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config);

    tracing::info!(
        root = %state.streams.root().path().display(),
        vexis = %state.streams.vexis().path().display(),
        "streams ready"
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "habitat listening at http://{bind_addr}/");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down habitat server");
        })
        .await?;

    Ok(())
}
