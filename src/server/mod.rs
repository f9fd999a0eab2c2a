//! Reference remote task store and AI artifact store served over HTTP.
//!
//! Everything lives in memory; restarting the server loses all tasks and
//! cached artifacts. Status permission rules are enforced by the client, not
//! here.

pub mod api;
pub mod generator;
pub mod memory;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use api::{AppState, SharedState, api_router};
pub use generator::{ArtifactGenerator, GenerationContext, TemplateGenerator};
pub use memory::MemoryStore;

use crate::board::events::TaskEvents;

/// Configuration for the reference server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allow cross-origin requests from any origin.
    pub cors: bool,
    /// Org to fill with demo tasks on startup.
    pub seed_org: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4040,
            cors: false,
            seed_org: None,
        }
    }
}

/// Build the application router with API routes and request tracing.
pub fn build_router(state: SharedState) -> Router {
    api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the server and run until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let events = TaskEvents::new();
    let store = Arc::new(MemoryStore::new(
        events.clone(),
        Arc::new(TemplateGenerator),
    ));

    if let Some(org) = &config.seed_org {
        store
            .seed_demo(org)
            .await
            .with_context(|| format!("Failed to seed demo board for '{}'", org))?;
    }

    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            tracing::info!(task_id = event.task_id(), "broadcast {:?}", event);
        }
    });

    let mut app = build_router(Arc::new(AppState::in_memory(store)));
    if config.cors {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    println!("Aether store running at http://{}", local_addr);
    tracing::info!(%local_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}
