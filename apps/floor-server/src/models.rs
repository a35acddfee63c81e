use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub agent_id: String,
    pub name: String,
    pub role: String,
    pub status: String,
    pub current_task: Option<String>,
    pub position_zone: String,
    pub position_x: f64,
    pub position_y: f64,
    pub created_at: String,
}

/// Append-only record of one accepted business event. `inferred_actions`
/// keeps the engine output verbatim so the feed can be replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub from_agent: Option<String>,
    pub to_agent: Option<String>,
    pub event_type: String,
    pub payload: Value,
    pub inferred_actions: Vec<String>,
    pub timestamp: String,
}

/// One in-flight animation. Progress is driven by the dashboard client,
/// never by server time; `progress >= 1.0` marks completion but the record
/// survives until an explicit cleanup call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub agent_id: String,
    pub from_zone: String,
    pub to_zone: String,
    pub purpose: String,
    pub artifact: Option<String>,
    pub progress: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    pub role_id: String,
    pub display_name: String,
    pub color: String,
    pub zone_color: String,
    pub is_default: bool,
}

/// One company aggregate. The dashmap entry holding it is the unit of
/// atomicity: every effect of an event lands under its write lock or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyState {
    pub company: Company,
    pub agents: Vec<Agent>,
    pub events: Vec<Event>,
    pub movements: Vec<Movement>,
}

// === WIRE TYPES (Dev App ingestion) ===

#[derive(Debug, Clone, Deserialize)]
pub struct AgentCreate {
    pub agent_id: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub agents: Vec<AgentCreate>,
}

fn empty_payload() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventCreate {
    pub company_id: Uuid,
    pub agent_id: String,
    pub event_type: String,
    #[serde(default = "empty_payload")]
    pub payload: Value,
    pub to_agent: Option<String>,
}

// === WIRE TYPES (dashboard read model) ===

#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub zone: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentView {
    pub agent_id: String,
    pub role: String,
    pub name: String,
    pub status: String,
    pub position: Position,
    pub current_task: Option<String>,
    pub role_config: RoleConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyStateView {
    pub company_id: Uuid,
    pub agents: Vec<AgentView>,
    pub pending_movements: Vec<Movement>,
    pub role_configs: HashMap<String, RoleConfig>,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyListItem {
    pub company_id: Uuid,
    pub name: String,
    pub agent_count: usize,
    pub last_activity: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: String,
    pub from_agent: Option<String>,
    pub to_agent: Option<String>,
    pub event_type: String,
    pub payload: Value,
    pub inferred_actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogsView {
    pub logs: Vec<LogEntry>,
    pub total: usize,
    pub has_more: bool,
}
