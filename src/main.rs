// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::analysis_service::AnalysisService;
use crate::application::fleet_service::FleetService;
use crate::application::ping_repository::PingRepository;
use crate::application::streaming_service::FleetStreamingService;
use crate::infrastructure::config::{load_engine_config, load_influx_config, load_server_config};
use crate::infrastructure::influx_repository::InfluxPingRepository;
use crate::infrastructure::model_artifacts::load_risk_model;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    health_check, list_vehicles, stream_fleet, vehicle_report, vehicle_score,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let influx_config = load_influx_config()?;
    let server_config = load_server_config()?;
    let engine_config = load_engine_config()?;

    // Create repository and model (infrastructure layer)
    let repository: Arc<dyn PingRepository> = Arc::new(InfluxPingRepository::new(influx_config.influx));
    let model = load_risk_model(engine_config.model_path.as_deref());

    // Create services (application layer)
    let fleet_service = FleetService::new(repository.clone());
    let analysis_service = AnalysisService::new(repository.clone(), model, engine_config.to_rules());
    let streaming_service = FleetStreamingService::new(repository, analysis_service.clone());

    if !analysis_service.predictive_insight_available() {
        tracing::warn!("Running in score-only mode");
    }

    // Create application state
    let state = Arc::new(AppState {
        fleet_service,
        analysis_service,
        streaming_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/vehicles", get(list_vehicles))
        .route("/vehicles/:id/report", get(vehicle_report))
        .route("/vehicles/:id/score", get(vehicle_score))
        .route("/fleet/stream", get(stream_fleet))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = server_config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", server_config.server.bind_addr))?;
    tracing::info!("Starting ecodrive-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
