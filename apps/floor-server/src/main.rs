// [[AGENTFLOOR]]/apps/floor-server/src/main.rs
// Purpose: Entry point. Rehydrates persisted state before starting the server.
// Architecture: Application Boot
// Dependencies: Axum, Tower, Tokio

mod error;
mod inference;
mod models;
mod movement;
mod projector;
mod roles;
mod runtime;
mod server;
mod zones;

use axum::{
    http::Method,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::runtime::FloorRuntime;
use crate::server::handlers;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agentfloor_kernel=debug".parse().unwrap())
                .add_directive("tower_http=trace".parse().unwrap()),
        )
        .init();

    tracing::info!("Initializing AgentFloor Kernel...");

    let runtime = Arc::new(FloorRuntime::new());

    // === PERSISTENCE RECOVERY ===
    // Attempt to load previously registered companies from Redis into memory
    runtime.rehydrate_from_redis().await;

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/companies",
            post(handlers::create_company).get(handlers::list_companies),
        )
        .route("/api/companies/:company_id", get(handlers::get_company))
        .route("/api/companies/:company_id/state", get(handlers::company_state))
        .route("/api/companies/:company_id/logs", get(handlers::company_logs))
        .route("/api/companies/:company_id/agents", post(handlers::create_agent))
        .route(
            "/api/companies/:company_id/agents/:agent_id",
            delete(handlers::delete_agent),
        )
        .route("/api/events", post(handlers::create_event))
        .route(
            "/api/companies/:company_id/movements/cleanup",
            delete(handlers::cleanup_movements),
        )
        .route(
            "/api/companies/:company_id/movements/:movement_id",
            patch(handlers::update_movement_progress),
        )
        .route(
            "/api/companies/:company_id/movements/:movement_id/complete",
            post(handlers::complete_movement),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(runtime);

    let port = std::env::var("FLOOR_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to port");

    tracing::info!("AgentFloor Kernel Server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
