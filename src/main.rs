//! duel-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use duel_gateway::app_state::AppState;
use duel_gateway::build_app;
use duel_gateway::config::{GatewayConfig, LogFormat};
use duel_gateway::domain::{EventBus, QuizBank};
use duel_gateway::service::DuelService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting duel-gateway");

    // Load the question bank
    let bank = match &config.quiz_bank_path {
        Some(path) => QuizBank::from_json_file(path)?,
        None => QuizBank::builtin(),
    };
    tracing::info!(questions = bank.len(), "question bank loaded");

    // Build domain and service layers
    let event_bus = EventBus::new(config.event_bus_capacity);
    let duel_service = DuelService::new(Arc::new(bank), event_bus, config.duel_settings());
    let app = build_app(AppState::new(duel_service));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
