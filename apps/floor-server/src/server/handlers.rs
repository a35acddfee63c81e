// [[AGENTFLOOR]]/apps/floor-server/src/server/handlers.rs
// Purpose: API Handlers. Thin wrappers mapping HTTP onto the runtime.
// Architecture: API Layer
// Dependencies: Axum, Runtime

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::FloorError;
use crate::models::{AgentCreate, CompanyCreate, CompanyStateView, EventCreate, LogsView};
use crate::runtime::FloorRuntime;

#[derive(serde::Deserialize)]
pub struct ListQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(serde::Deserialize)]
pub struct LogsQuery {
    agent_id: Option<String>,
    event_type: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(serde::Deserialize)]
pub struct ProgressQuery {
    progress: f64,
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    database: String,
}

pub async fn health(State(runtime): State<Arc<FloorRuntime>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: runtime.redis_status().await.to_string(),
    })
}

pub async fn create_company(
    State(runtime): State<Arc<FloorRuntime>>,
    Json(req): Json<CompanyCreate>,
) -> Result<(StatusCode, Json<serde_json::Value>), FloorError> {
    let company = runtime.create_company(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "company_id": company.id,
            "name": company.name,
            "created_at": company.created_at,
        })),
    ))
}

pub async fn list_companies(
    State(runtime): State<Arc<FloorRuntime>>,
    Query(query): Query<ListQuery>,
) -> Json<serde_json::Value> {
    let companies =
        runtime.list_companies(query.limit.unwrap_or(100), query.offset.unwrap_or(0));
    Json(json!({ "companies": companies }))
}

pub async fn get_company(
    State(runtime): State<Arc<FloorRuntime>>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, FloorError> {
    let company = runtime.get_company(&company_id)?;
    Ok(Json(json!({
        "company_id": company.id,
        "name": company.name,
        "description": company.description,
        "created_at": company.created_at,
    })))
}

pub async fn create_agent(
    State(runtime): State<Arc<FloorRuntime>>,
    Path(company_id): Path<Uuid>,
    Json(req): Json<AgentCreate>,
) -> Result<(StatusCode, Json<serde_json::Value>), FloorError> {
    let (agent, role_config) = runtime.add_agent(&company_id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "agent_id": agent.agent_id,
            "name": agent.name,
            "role": agent.role,
            "status": agent.status,
            "position": {
                "zone": agent.position_zone,
                "x": agent.position_x,
                "y": agent.position_y,
            },
            "role_config": role_config,
        })),
    ))
}

pub async fn delete_agent(
    State(runtime): State<Arc<FloorRuntime>>,
    Path((company_id, agent_id)): Path<(Uuid, String)>,
) -> Result<Json<serde_json::Value>, FloorError> {
    runtime.delete_agent(&company_id, &agent_id).await?;
    Ok(Json(json!({ "agent_id": agent_id, "status": "deleted" })))
}

pub async fn create_event(
    State(runtime): State<Arc<FloorRuntime>>,
    Json(req): Json<EventCreate>,
) -> Result<Json<serde_json::Value>, FloorError> {
    let event = runtime.ingest_event(req).await?;
    Ok(Json(json!({
        "event_id": event.id,
        "timestamp": event.timestamp,
        "status": "accepted",
    })))
}

pub async fn company_state(
    State(runtime): State<Arc<FloorRuntime>>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<CompanyStateView>, FloorError> {
    runtime.company_state(&company_id).map(Json)
}

pub async fn company_logs(
    State(runtime): State<Arc<FloorRuntime>>,
    Path(company_id): Path<Uuid>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsView>, FloorError> {
    runtime
        .company_logs(
            &company_id,
            query.agent_id.as_deref(),
            query.event_type.as_deref(),
            query.limit.unwrap_or(100),
            query.offset.unwrap_or(0),
        )
        .map(Json)
}

pub async fn update_movement_progress(
    State(runtime): State<Arc<FloorRuntime>>,
    Path((company_id, movement_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<serde_json::Value>, FloorError> {
    let movement = runtime
        .update_movement_progress(&company_id, &movement_id, query.progress)
        .await?;
    Ok(Json(json!({
        "movement_id": movement.id,
        "progress": movement.progress,
    })))
}

pub async fn complete_movement(
    State(runtime): State<Arc<FloorRuntime>>,
    Path((company_id, movement_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, FloorError> {
    let movement = runtime.complete_movement(&company_id, &movement_id).await?;
    Ok(Json(json!({
        "movement_id": movement.id,
        "status": "completed",
    })))
}

pub async fn cleanup_movements(
    State(runtime): State<Arc<FloorRuntime>>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, FloorError> {
    let deleted = runtime.cleanup_movements(&company_id).await?;
    tracing::debug!("Cleaned up {} movements for company {}", deleted, company_id);
    Ok(Json(json!({ "deleted_count": deleted })))
}
