// [[AGENTFLOOR]]/apps/floor-server/src/runtime.rs
// Purpose: Company store, event pipeline and movement lifecycle, with Redis persistence.
// Architecture: Domain Logic Layer
// Dependencies: dashmap, redis, serde_json, chrono

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::env;
use uuid::Uuid;

use crate::error::FloorError;
use crate::inference;
use crate::models::*;
use crate::movement;
use crate::projector;
use crate::roles::RoleRegistry;
use crate::zones;

const DEFAULT_AGENT_LIMIT: usize = 50;

/// A company with no events for this long shows as "inactive" in listings.
const ACTIVITY_WINDOW_SECS: i64 = 300;

pub struct FloorRuntime {
    companies: DashMap<Uuid, CompanyState>,
    pub role_registry: RoleRegistry,
    pub redis_client: Option<redis::Client>,
    max_agents_per_company: usize,
}

impl FloorRuntime {
    pub fn new() -> Self {
        // Initialize Redis Client (optional, non-blocking)
        let redis_client = match env::var("REDIS_URL") {
            Ok(url) => match redis::Client::open(url.as_str()) {
                Ok(client) => {
                    tracing::info!("Redis client initialized: {}", url);
                    Some(client)
                }
                Err(e) => {
                    tracing::warn!("Failed to create Redis client: {}. Persistence disabled.", e);
                    None
                }
            },
            Err(_) => {
                tracing::warn!("REDIS_URL not set. Running without persistence.");
                None
            }
        };

        let max_agents = env::var("MAX_AGENTS_PER_COMPANY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_AGENT_LIMIT);

        Self::with_parts(redis_client, max_agents)
    }

    fn with_parts(redis_client: Option<redis::Client>, max_agents_per_company: usize) -> Self {
        FloorRuntime {
            companies: DashMap::new(),
            role_registry: RoleRegistry::new(),
            redis_client,
            max_agents_per_company,
        }
    }

    // === PERSISTENCE LAYER ===

    /// Saves one company aggregate to Redis and manages the company index.
    /// Best-effort: the in-memory store stays authoritative on any failure.
    async fn persist_company(&self, company_id: &Uuid) {
        let client = match &self.redis_client {
            Some(client) => client,
            None => return,
        };

        let json = match self.companies.get(company_id) {
            Some(state) => match serde_json::to_string(&*state) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize company {}: {}", company_id, e);
                    return;
                }
            },
            None => return,
        };

        match client.get_async_connection().await {
            Ok(mut con) => {
                let state_key = format!("company:{}:state", company_id);
                let _: redis::RedisResult<()> = con.set(&state_key, json).await;
                let _: redis::RedisResult<()> =
                    con.sadd("sys:companies", company_id.to_string()).await;
            }
            Err(e) => tracing::error!("Redis connection failed during persist: {}", e),
        }
    }

    /// Saves the role registry snapshot alongside the companies.
    async fn persist_roles(&self) {
        let client = match &self.redis_client {
            Some(client) => client,
            None => return,
        };

        let json = match serde_json::to_string(&self.role_registry.export()) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize role configs: {}", e);
                return;
            }
        };

        match client.get_async_connection().await {
            Ok(mut con) => {
                let _: redis::RedisResult<()> = con.set("sys:role_configs", json).await;
            }
            Err(e) => tracing::error!("Redis connection failed during persist: {}", e),
        }
    }

    /// Rehydrate state from Redis on boot.
    pub async fn rehydrate_from_redis(&self) {
        let client = match &self.redis_client {
            Some(client) => client,
            None => return,
        };

        tracing::info!("Attempting to rehydrate state from Redis...");
        let mut con = match client.get_async_connection().await {
            Ok(con) => con,
            Err(e) => {
                tracing::error!("Failed to connect to Redis for rehydration: {}", e);
                return;
            }
        };

        let roles_json: Option<String> = con.get("sys:role_configs").await.unwrap_or(None);
        if let Some(json) = roles_json {
            match serde_json::from_str::<Vec<RoleConfig>>(&json) {
                Ok(configs) => self.role_registry.hydrate(configs),
                Err(e) => tracing::error!("Failed to deserialize role configs: {}", e),
            }
        }

        let company_ids: Vec<String> = con.smembers("sys:companies").await.unwrap_or_default();
        tracing::info!("Found {} companies in persistence layer.", company_ids.len());

        for raw_id in company_ids {
            let company_id = match raw_id.parse::<Uuid>() {
                Ok(id) => id,
                Err(_) => {
                    tracing::warn!("Skipping malformed company id in index: {}", raw_id);
                    continue;
                }
            };

            let state_key = format!("company:{}:state", company_id);
            let state_json: Option<String> = con.get(&state_key).await.unwrap_or(None);

            if let Some(json) = state_json {
                match serde_json::from_str::<CompanyState>(&json) {
                    Ok(state) => {
                        tracing::info!(
                            "Rehydrating company {} ({} agents, {} events)",
                            state.company.name,
                            state.agents.len(),
                            state.events.len()
                        );
                        self.companies.insert(company_id, state);
                    }
                    Err(e) => {
                        tracing::error!("Failed to deserialize company {}: {}", company_id, e)
                    }
                }
            }
        }
    }

    /// Redis connectivity for the health endpoint.
    pub async fn redis_status(&self) -> &'static str {
        let client = match &self.redis_client {
            Some(client) => client,
            None => return "disabled",
        };
        match client.get_async_connection().await {
            Ok(mut con) => match redis::cmd("PING").query_async::<_, String>(&mut con).await {
                Ok(_) => "connected",
                Err(_) => "disconnected",
            },
            Err(_) => "disconnected",
        }
    }

    // === COMPANY & AGENT REGISTRY ===

    pub async fn create_company(&self, req: CompanyCreate) -> Result<Company, FloorError> {
        let now = Utc::now().to_rfc3339();
        let company = Company {
            id: Uuid::new_v4(),
            name: req.name,
            description: req.description,
            created_at: now.clone(),
            updated_at: now,
        };

        let mut state = CompanyState {
            company: company.clone(),
            agents: Vec::new(),
            events: Vec::new(),
            movements: Vec::new(),
        };

        // Initial agents go through the same checks as the agent endpoint,
        // and a bad batch leaves no company behind.
        for agent_req in &req.agents {
            let agent = self.build_agent(&state, agent_req)?;
            self.role_registry.resolve(&agent.role);
            state.agents.push(agent);
        }

        self.companies.insert(company.id, state);
        tracing::info!(
            "Created company {} ({}) with {} agents",
            company.name,
            company.id,
            req.agents.len()
        );

        self.persist_company(&company.id).await;
        self.persist_roles().await;
        Ok(company)
    }

    pub fn list_companies(&self, limit: usize, offset: usize) -> Vec<CompanyListItem> {
        let now = Utc::now();
        let mut items: Vec<CompanyListItem> = self
            .companies
            .iter()
            .map(|state| {
                let last_activity = state.events.last().map(|e| e.timestamp.clone());
                let status = match &last_activity {
                    Some(ts) => activity_status(ts, now),
                    None => "inactive",
                };
                CompanyListItem {
                    company_id: state.company.id,
                    name: state.company.name.clone(),
                    agent_count: state.agents.len(),
                    last_activity,
                    status: status.to_string(),
                }
            })
            .collect();

        // DashMap iteration order is arbitrary; pin the listing to name order.
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.company_id.cmp(&b.company_id)));
        items.into_iter().skip(offset).take(limit).collect()
    }

    pub fn get_company(&self, company_id: &Uuid) -> Result<Company, FloorError> {
        self.companies
            .get(company_id)
            .map(|state| state.company.clone())
            .ok_or(FloorError::CompanyNotFound)
    }

    fn build_agent(&self, state: &CompanyState, req: &AgentCreate) -> Result<Agent, FloorError> {
        if state.agents.iter().any(|a| a.agent_id == req.agent_id) {
            return Err(FloorError::DuplicateAgent(req.agent_id.clone()));
        }
        if state.agents.len() >= self.max_agents_per_company {
            return Err(FloorError::AgentLimitExceeded(self.max_agents_per_company));
        }

        let zone = zones::home_zone(&req.role).to_string();
        let (x, y) = zones::zone_anchor(&zone);
        Ok(Agent {
            id: Uuid::new_v4(),
            agent_id: req.agent_id.clone(),
            name: req.name.clone(),
            role: req.role.clone(),
            status: "idle".to_string(),
            current_task: None,
            position_zone: zone,
            position_x: x,
            position_y: y,
            created_at: Utc::now().to_rfc3339(),
        })
    }

    pub async fn add_agent(
        &self,
        company_id: &Uuid,
        req: AgentCreate,
    ) -> Result<(Agent, RoleConfig), FloorError> {
        let agent = {
            let mut state = self
                .companies
                .get_mut(company_id)
                .ok_or(FloorError::CompanyNotFound)?;

            let agent = self.build_agent(&state, &req)?;
            state.agents.push(agent.clone());
            state.company.updated_at = Utc::now().to_rfc3339();
            agent
        };

        let config = self.role_registry.resolve(&agent.role);
        self.persist_company(company_id).await;
        self.persist_roles().await;
        Ok((agent, config))
    }

    /// Removes an agent and everything hanging off it: its movements and
    /// every event it appears on, either side.
    pub async fn delete_agent(&self, company_id: &Uuid, agent_id: &str) -> Result<(), FloorError> {
        {
            let mut state = self
                .companies
                .get_mut(company_id)
                .ok_or(FloorError::CompanyNotFound)?;

            let before = state.agents.len();
            state.agents.retain(|a| a.agent_id != agent_id);
            if state.agents.len() == before {
                return Err(FloorError::AgentNotFound(agent_id.to_string()));
            }

            state.movements.retain(|m| m.agent_id != agent_id);
            state.events.retain(|e| {
                e.from_agent.as_deref() != Some(agent_id)
                    && e.to_agent.as_deref() != Some(agent_id)
            });
            state.company.updated_at = Utc::now().to_rfc3339();
        }

        tracing::info!("Deleted agent {} from company {}", agent_id, company_id);
        self.persist_company(company_id).await;
        Ok(())
    }

    // === EVENT PIPELINE ===

    /// Accepts one business event: validate, infer, synthesize movements,
    /// project agent state, append to the log. Everything after validation
    /// happens under the company entry lock, so either all of an event's
    /// effects land or none do.
    pub async fn ingest_event(&self, req: EventCreate) -> Result<Event, FloorError> {
        validate_event_type(&req.event_type)?;

        let event = {
            let mut state = self
                .companies
                .get_mut(&req.company_id)
                .ok_or(FloorError::CompanyNotFound)?;

            let actor = state
                .agents
                .iter()
                .find(|a| a.agent_id == req.agent_id)
                .cloned()
                .ok_or_else(|| FloorError::AgentNotFound(req.agent_id.clone()))?;

            let target = match &req.to_agent {
                Some(to_agent) => Some(
                    state
                        .agents
                        .iter()
                        .find(|a| a.agent_id == *to_agent)
                        .cloned()
                        .ok_or_else(|| FloorError::AgentNotFound(to_agent.clone()))?,
                ),
                None => None,
            };

            let actions = inference::infer(&req);

            // Movements read the pre-mutation snapshots; the projector then
            // rewrites the live records.
            let movements =
                movement::synthesize(&actions, &actor, target.as_ref(), &req.payload);
            projector::apply(&actions, &mut state.agents, &req.payload);
            state.movements.extend(movements);

            let event = Event {
                id: Uuid::new_v4(),
                from_agent: Some(req.agent_id.clone()),
                to_agent: req.to_agent.clone(),
                event_type: inference::canonical_event_type(&req.event_type),
                payload: req.payload.clone(),
                inferred_actions: actions.iter().map(|a| a.to_string()).collect(),
                timestamp: Utc::now().to_rfc3339(),
            };
            state.events.push(event.clone());
            state.company.updated_at = event.timestamp.clone();
            event
        };

        tracing::debug!(
            "Accepted event {} ({}) for company {}",
            event.id,
            event.event_type,
            req.company_id
        );
        self.persist_company(&req.company_id).await;
        Ok(event)
    }

    // === MOVEMENT LIFECYCLE ===

    /// Overwrites a movement's progress. No monotonicity is enforced; the
    /// animation client may rewind.
    pub async fn update_movement_progress(
        &self,
        company_id: &Uuid,
        movement_id: &Uuid,
        progress: f64,
    ) -> Result<Movement, FloorError> {
        if !(0.0..=1.0).contains(&progress) {
            return Err(FloorError::InvalidProgress(progress));
        }

        let movement = {
            let mut state = self
                .companies
                .get_mut(company_id)
                .ok_or(FloorError::CompanyNotFound)?;

            let movement = state
                .movements
                .iter_mut()
                .find(|m| m.id == *movement_id)
                .ok_or(FloorError::MovementNotFound)?;
            movement.progress = progress;
            movement.clone()
        };

        self.persist_company(company_id).await;
        Ok(movement)
    }

    /// Marks a movement completed and applies its terminal state to the
    /// agent: position lands on `to_zone`, and a "return" leg closes the
    /// courier loop by resetting the agent to idle. Safe to call twice;
    /// the second call re-applies the same terminal state.
    pub async fn complete_movement(
        &self,
        company_id: &Uuid,
        movement_id: &Uuid,
    ) -> Result<Movement, FloorError> {
        let movement = {
            let mut state = self
                .companies
                .get_mut(company_id)
                .ok_or(FloorError::CompanyNotFound)?;

            let idx = state
                .movements
                .iter()
                .position(|m| m.id == *movement_id)
                .ok_or(FloorError::MovementNotFound)?;
            state.movements[idx].progress = 1.0;
            let movement = state.movements[idx].clone();

            match state
                .agents
                .iter_mut()
                .find(|a| a.agent_id == movement.agent_id)
            {
                Some(agent) => {
                    agent.position_zone = movement.to_zone.clone();
                    if movement.purpose == "return" {
                        agent.status = "idle".to_string();
                    }
                }
                // Agent deleted mid-flight; completion still counts.
                None => {}
            }
            movement
        };

        self.persist_company(company_id).await;
        Ok(movement)
    }

    /// Garbage-collects completed movements. Pending ones are never touched,
    /// and nothing expires on its own; this is purely client-triggered.
    pub async fn cleanup_movements(&self, company_id: &Uuid) -> Result<usize, FloorError> {
        let deleted = {
            let mut state = self
                .companies
                .get_mut(company_id)
                .ok_or(FloorError::CompanyNotFound)?;

            let before = state.movements.len();
            state.movements.retain(|m| m.progress < 1.0);
            before - state.movements.len()
        };

        self.persist_company(company_id).await;
        Ok(deleted)
    }

    // === READ MODEL ===

    /// The single snapshot the dashboard polls.
    pub fn company_state(&self, company_id: &Uuid) -> Result<CompanyStateView, FloorError> {
        let state = self
            .companies
            .get(company_id)
            .ok_or(FloorError::CompanyNotFound)?;

        let agents: Vec<AgentView> = state
            .agents
            .iter()
            .map(|a| AgentView {
                agent_id: a.agent_id.clone(),
                role: a.role.clone(),
                name: a.name.clone(),
                status: a.status.clone(),
                position: Position {
                    zone: a.position_zone.clone(),
                    x: a.position_x,
                    y: a.position_y,
                },
                current_task: a.current_task.clone(),
                role_config: self.role_registry.resolve(&a.role),
            })
            .collect();

        let pending_movements: Vec<Movement> = state
            .movements
            .iter()
            .filter(|m| m.progress < 1.0)
            .cloned()
            .collect();

        let role_configs: HashMap<String, RoleConfig> = state
            .agents
            .iter()
            .map(|a| (a.role.clone(), self.role_registry.resolve(&a.role)))
            .collect();

        Ok(CompanyStateView {
            company_id: *company_id,
            agents,
            pending_movements,
            role_configs,
            last_updated: Utc::now().to_rfc3339(),
        })
    }

    /// Activity feed, newest first. `agent_id` matches either side of an
    /// event; `event_type` matches case-insensitively.
    pub fn company_logs(
        &self,
        company_id: &Uuid,
        agent_id: Option<&str>,
        event_type: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<LogsView, FloorError> {
        let state = self
            .companies
            .get(company_id)
            .ok_or(FloorError::CompanyNotFound)?;

        let wanted_type = event_type.map(inference::canonical_event_type);
        let filtered: Vec<&Event> = state
            .events
            .iter()
            .rev()
            .filter(|e| {
                if let Some(agent) = agent_id {
                    if e.from_agent.as_deref() != Some(agent)
                        && e.to_agent.as_deref() != Some(agent)
                    {
                        return false;
                    }
                }
                if let Some(wanted) = &wanted_type {
                    if e.event_type != *wanted {
                        return false;
                    }
                }
                true
            })
            .collect();

        let total = filtered.len();
        let has_more = offset + limit < total;
        let logs = filtered
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|e| LogEntry {
                id: e.id,
                timestamp: e.timestamp.clone(),
                from_agent: e.from_agent.clone(),
                to_agent: e.to_agent.clone(),
                event_type: e.event_type.clone(),
                payload: e.payload.clone(),
                inferred_actions: e.inferred_actions.clone(),
            })
            .collect();

        Ok(LogsView {
            logs,
            total,
            has_more,
        })
    }
}

/// Event types come from external apps; constrain them to the documented
/// character set before anything touches state.
fn validate_event_type(event_type: &str) -> Result<(), FloorError> {
    if event_type.is_empty() || event_type.len() > 100 {
        return Err(FloorError::InvalidEventType(
            "must be 1-100 characters".to_string(),
        ));
    }
    if !event_type
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(FloorError::InvalidEventType(
            "only alphanumeric characters and underscores allowed".to_string(),
        ));
    }
    Ok(())
}

fn activity_status(last_activity: &str, now: DateTime<Utc>) -> &'static str {
    match DateTime::parse_from_rfc3339(last_activity) {
        Ok(ts) => {
            if now.signed_duration_since(ts.with_timezone(&Utc))
                <= Duration::seconds(ACTIVITY_WINDOW_SECS)
            {
                "active"
            } else {
                "inactive"
            }
        }
        Err(_) => "inactive",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn runtime() -> FloorRuntime {
        FloorRuntime::with_parts(None, DEFAULT_AGENT_LIMIT)
    }

    async fn acme(runtime: &FloorRuntime) -> Uuid {
        let company = runtime
            .create_company(CompanyCreate {
                name: "Acme".to_string(),
                description: None,
                agents: vec![
                    AgentCreate {
                        agent_id: "BA-001".to_string(),
                        name: "Alice".to_string(),
                        role: "ba".to_string(),
                    },
                    AgentCreate {
                        agent_id: "DEV-001".to_string(),
                        name: "Bob".to_string(),
                        role: "developer".to_string(),
                    },
                ],
            })
            .await
            .unwrap();
        company.id
    }

    fn work_request(company_id: Uuid) -> EventCreate {
        EventCreate {
            company_id,
            agent_id: "BA-001".to_string(),
            event_type: "WORK_REQUEST".to_string(),
            payload: json!({"artifact": "spec.doc"}),
            to_agent: Some("DEV-001".to_string()),
        }
    }

    fn agent_status(runtime: &FloorRuntime, company_id: &Uuid, agent_id: &str) -> String {
        let state = runtime.company_state(company_id).unwrap();
        state
            .agents
            .iter()
            .find(|a| a.agent_id == agent_id)
            .unwrap()
            .status
            .clone()
    }

    #[tokio::test]
    async fn work_request_walks_actor_and_creates_handoff_movement() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;

        runtime.ingest_event(work_request(company_id)).await.unwrap();

        let state = runtime.company_state(&company_id).unwrap();
        let ba = state.agents.iter().find(|a| a.agent_id == "BA-001").unwrap();
        assert_eq!(ba.status, "walking");

        let handoff = state
            .pending_movements
            .iter()
            .find(|m| m.purpose == "handoff")
            .unwrap();
        assert_eq!(handoff.agent_id, "BA-001");
        assert_eq!(handoff.artifact.as_deref(), Some("spec.doc"));
        assert_eq!(handoff.progress, 0.0);
        assert_eq!(handoff.from_zone, "designing");
        assert_eq!(handoff.to_zone, "coding");
    }

    #[tokio::test]
    async fn unknown_event_type_is_accepted_with_working_fallback() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;

        runtime
            .ingest_event(EventCreate {
                company_id,
                agent_id: "DEV-001".to_string(),
                event_type: "UNKNOWN_XYZ".to_string(),
                payload: json!({}),
                to_agent: None,
            })
            .await
            .unwrap();

        assert_eq!(agent_status(&runtime, &company_id, "DEV-001"), "working");
    }

    #[tokio::test]
    async fn event_type_character_class_is_enforced() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;

        let mut bad = work_request(company_id);
        bad.event_type = "WORK REQUEST!".to_string();
        let err = runtime.ingest_event(bad).await.unwrap_err();
        assert!(matches!(err, FloorError::InvalidEventType(_)));

        let mut long = work_request(company_id);
        long.event_type = "X".repeat(101);
        let err = runtime.ingest_event(long).await.unwrap_err();
        assert!(matches!(err, FloorError::InvalidEventType(_)));

        // Rejected events never reach the log.
        let logs = runtime
            .company_logs(&company_id, None, None, 100, 0)
            .unwrap();
        assert_eq!(logs.total, 0);
    }

    #[tokio::test]
    async fn unknown_actor_or_target_is_a_404_before_any_mutation() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;

        let mut no_actor = work_request(company_id);
        no_actor.agent_id = "GHOST-001".to_string();
        assert!(matches!(
            runtime.ingest_event(no_actor).await.unwrap_err(),
            FloorError::AgentNotFound(_)
        ));

        let mut no_target = work_request(company_id);
        no_target.to_agent = Some("GHOST-002".to_string());
        assert!(matches!(
            runtime.ingest_event(no_target).await.unwrap_err(),
            FloorError::AgentNotFound(_)
        ));

        let state = runtime.company_state(&company_id).unwrap();
        assert!(state.pending_movements.is_empty());
        assert_eq!(agent_status(&runtime, &company_id, "BA-001"), "idle");
    }

    #[tokio::test]
    async fn event_type_is_stored_canonicalized() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;

        let mut lower = work_request(company_id);
        lower.event_type = "work_request".to_string();
        runtime.ingest_event(lower).await.unwrap();

        let logs = runtime
            .company_logs(&company_id, None, Some("Work_Request"), 100, 0)
            .unwrap();
        assert_eq!(logs.total, 1);
        assert_eq!(logs.logs[0].event_type, "WORK_REQUEST");
        assert_eq!(
            logs.logs[0].inferred_actions,
            vec![
                "BA-001:walk_to:DEV-001",
                "BA-001:handoff:DEV-001",
                "BA-001:return",
                "DEV-001:status:working",
            ]
        );
    }

    #[tokio::test]
    async fn task_lifecycle_sets_and_clears_current_task() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;

        runtime
            .ingest_event(EventCreate {
                company_id,
                agent_id: "DEV-001".to_string(),
                event_type: "WORKING".to_string(),
                payload: json!({"task": "Implementing feature"}),
                to_agent: None,
            })
            .await
            .unwrap();

        let state = runtime.company_state(&company_id).unwrap();
        let dev = state.agents.iter().find(|a| a.agent_id == "DEV-001").unwrap();
        assert_eq!(dev.current_task.as_deref(), Some("Implementing feature"));

        runtime
            .ingest_event(EventCreate {
                company_id,
                agent_id: "DEV-001".to_string(),
                event_type: "IDLE".to_string(),
                payload: json!({}),
                to_agent: None,
            })
            .await
            .unwrap();

        let state = runtime.company_state(&company_id).unwrap();
        let dev = state.agents.iter().find(|a| a.agent_id == "DEV-001").unwrap();
        assert_eq!(dev.status, "idle");
        assert_eq!(dev.current_task, None);
    }

    #[tokio::test]
    async fn progress_update_accepts_bounds_and_rejects_outside() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;
        runtime.ingest_event(work_request(company_id)).await.unwrap();

        let movement_id = runtime.company_state(&company_id).unwrap().pending_movements[0].id;

        for progress in [0.0, 0.5, 1.0] {
            let updated = runtime
                .update_movement_progress(&company_id, &movement_id, progress)
                .await
                .unwrap();
            assert_eq!(updated.progress, progress);
        }

        for progress in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                runtime
                    .update_movement_progress(&company_id, &movement_id, progress)
                    .await
                    .unwrap_err(),
                FloorError::InvalidProgress(_)
            ));
        }
    }

    #[tokio::test]
    async fn complete_applies_zone_and_return_closes_the_loop() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;
        runtime.ingest_event(work_request(company_id)).await.unwrap();

        let state = runtime.company_state(&company_id).unwrap();
        let handoff = state
            .pending_movements
            .iter()
            .find(|m| m.purpose == "handoff")
            .unwrap()
            .clone();
        let ret = state
            .pending_movements
            .iter()
            .find(|m| m.purpose == "return")
            .unwrap()
            .clone();

        runtime
            .complete_movement(&company_id, &handoff.id)
            .await
            .unwrap();
        let state = runtime.company_state(&company_id).unwrap();
        let ba = state.agents.iter().find(|a| a.agent_id == "BA-001").unwrap();
        assert_eq!(ba.position.zone, handoff.to_zone);
        assert_eq!(ba.status, "walking");

        runtime.complete_movement(&company_id, &ret.id).await.unwrap();
        let state = runtime.company_state(&company_id).unwrap();
        let ba = state.agents.iter().find(|a| a.agent_id == "BA-001").unwrap();
        assert_eq!(ba.position.zone, "designing");
        assert_eq!(ba.status, "idle");
    }

    #[tokio::test]
    async fn complete_is_idempotent() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;
        runtime.ingest_event(work_request(company_id)).await.unwrap();

        let movement_id = runtime.company_state(&company_id).unwrap().pending_movements[0].id;

        let first = runtime
            .complete_movement(&company_id, &movement_id)
            .await
            .unwrap();
        let zone_after_first = agent_zone(&runtime, &company_id, "BA-001");
        let status_after_first = agent_status(&runtime, &company_id, "BA-001");

        let second = runtime
            .complete_movement(&company_id, &movement_id)
            .await
            .unwrap();
        assert_eq!(first.progress, second.progress);
        assert_eq!(zone_after_first, agent_zone(&runtime, &company_id, "BA-001"));
        assert_eq!(status_after_first, agent_status(&runtime, &company_id, "BA-001"));
    }

    fn agent_zone(runtime: &FloorRuntime, company_id: &Uuid, agent_id: &str) -> String {
        let state = runtime.company_state(company_id).unwrap();
        state
            .agents
            .iter()
            .find(|a| a.agent_id == agent_id)
            .unwrap()
            .position
            .zone
            .clone()
    }

    #[tokio::test]
    async fn rewinding_a_completed_movement_does_not_revert_position() {
        // Known wrinkle, preserved on purpose: progress may go back below
        // 1.0 after completion, but the agent keeps the applied position.
        let runtime = runtime();
        let company_id = acme(&runtime).await;
        runtime.ingest_event(work_request(company_id)).await.unwrap();

        let state = runtime.company_state(&company_id).unwrap();
        let handoff = state
            .pending_movements
            .iter()
            .find(|m| m.purpose == "handoff")
            .unwrap()
            .clone();

        runtime
            .complete_movement(&company_id, &handoff.id)
            .await
            .unwrap();
        runtime
            .update_movement_progress(&company_id, &handoff.id, 0.2)
            .await
            .unwrap();

        assert_eq!(agent_zone(&runtime, &company_id, "BA-001"), handoff.to_zone);
    }

    #[tokio::test]
    async fn cleanup_removes_only_completed_movements() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;
        runtime.ingest_event(work_request(company_id)).await.unwrap();

        let state = runtime.company_state(&company_id).unwrap();
        assert_eq!(state.pending_movements.len(), 2);
        let first = state.pending_movements[0].id;

        runtime.complete_movement(&company_id, &first).await.unwrap();

        let deleted = runtime.cleanup_movements(&company_id).await.unwrap();
        assert_eq!(deleted, 1);

        let state = runtime.company_state(&company_id).unwrap();
        assert_eq!(state.pending_movements.len(), 1);

        // Nothing left at or above the threshold.
        assert_eq!(runtime.cleanup_movements(&company_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_agent_and_limit_are_rejected() {
        let runtime = FloorRuntime::with_parts(None, 3);
        let company_id = acme(&runtime).await;

        let err = runtime
            .add_agent(
                &company_id,
                AgentCreate {
                    agent_id: "BA-001".to_string(),
                    name: "Clone".to_string(),
                    role: "ba".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, FloorError::DuplicateAgent("BA-001".to_string()));

        runtime
            .add_agent(
                &company_id,
                AgentCreate {
                    agent_id: "QA-001".to_string(),
                    name: "Carol".to_string(),
                    role: "qa".to_string(),
                },
            )
            .await
            .unwrap();

        let err = runtime
            .add_agent(
                &company_id,
                AgentCreate {
                    agent_id: "QA-002".to_string(),
                    name: "Dan".to_string(),
                    role: "qa".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, FloorError::AgentLimitExceeded(3));

        let state = runtime.company_state(&company_id).unwrap();
        assert_eq!(state.agents.len(), 3);
    }

    #[tokio::test]
    async fn custom_role_gets_lazy_config_in_snapshot() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;

        runtime
            .add_agent(
                &company_id,
                AgentCreate {
                    agent_id: "SEC-001".to_string(),
                    name: "Eve".to_string(),
                    role: "security_engineer".to_string(),
                },
            )
            .await
            .unwrap();

        let state = runtime.company_state(&company_id).unwrap();
        let config = state.role_configs.get("security_engineer").unwrap();
        assert_eq!(config.display_name, "Security Engineer");
        assert!(!config.is_default);
        assert!(state.role_configs.contains_key("ba"));
        assert!(state.role_configs.contains_key("developer"));
    }

    #[tokio::test]
    async fn delete_agent_cascades_movements_and_events() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;
        runtime.ingest_event(work_request(company_id)).await.unwrap();

        runtime.delete_agent(&company_id, "BA-001").await.unwrap();

        let state = runtime.company_state(&company_id).unwrap();
        assert!(state.agents.iter().all(|a| a.agent_id != "BA-001"));
        assert!(state.pending_movements.is_empty());

        let logs = runtime
            .company_logs(&company_id, None, None, 100, 0)
            .unwrap();
        assert_eq!(logs.total, 0);

        assert_eq!(
            runtime.delete_agent(&company_id, "BA-001").await.unwrap_err(),
            FloorError::AgentNotFound("BA-001".to_string())
        );
    }

    #[tokio::test]
    async fn logs_filter_by_agent_and_type_and_paginate() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;

        for (agent, event_type) in [
            ("BA-001", "THINKING"),
            ("BA-001", "WORKING"),
            ("DEV-001", "WORKING"),
            ("DEV-001", "ERROR"),
        ] {
            runtime
                .ingest_event(EventCreate {
                    company_id,
                    agent_id: agent.to_string(),
                    event_type: event_type.to_string(),
                    payload: json!({}),
                    to_agent: None,
                })
                .await
                .unwrap();
        }
        runtime.ingest_event(work_request(company_id)).await.unwrap();

        // Newest first.
        let all = runtime
            .company_logs(&company_id, None, None, 100, 0)
            .unwrap();
        assert_eq!(all.total, 5);
        assert_eq!(all.logs[0].event_type, "WORK_REQUEST");
        assert!(!all.has_more);

        // agent_id matches either side: DEV-001 was the target of the
        // work request.
        let dev = runtime
            .company_logs(&company_id, Some("DEV-001"), None, 100, 0)
            .unwrap();
        assert_eq!(dev.total, 3);

        let working = runtime
            .company_logs(&company_id, None, Some("working"), 100, 0)
            .unwrap();
        assert_eq!(working.total, 2);

        let both = runtime
            .company_logs(&company_id, Some("DEV-001"), Some("WORKING"), 100, 0)
            .unwrap();
        assert_eq!(both.total, 1);

        // Pagination.
        let page = runtime.company_logs(&company_id, None, None, 2, 0).unwrap();
        assert_eq!(page.logs.len(), 2);
        assert!(page.has_more);
        let last_page = runtime.company_logs(&company_id, None, None, 2, 4).unwrap();
        assert_eq!(last_page.logs.len(), 1);
        assert!(!last_page.has_more);
    }

    #[tokio::test]
    async fn company_listing_reports_activity() {
        let runtime = runtime();
        let company_id = acme(&runtime).await;
        runtime
            .create_company(CompanyCreate {
                name: "Idle Inc".to_string(),
                description: None,
                agents: vec![],
            })
            .await
            .unwrap();

        runtime.ingest_event(work_request(company_id)).await.unwrap();

        let items = runtime.list_companies(100, 0);
        assert_eq!(items.len(), 2);
        let acme = items.iter().find(|c| c.name == "Acme").unwrap();
        assert_eq!(acme.status, "active");
        assert_eq!(acme.agent_count, 2);
        assert!(acme.last_activity.is_some());

        let idle = items.iter().find(|c| c.name == "Idle Inc").unwrap();
        assert_eq!(idle.status, "inactive");
        assert_eq!(idle.last_activity, None);
    }

    #[tokio::test]
    async fn unknown_company_is_not_found_everywhere() {
        let runtime = runtime();
        let missing = Uuid::new_v4();

        assert_eq!(
            runtime.get_company(&missing).unwrap_err(),
            FloorError::CompanyNotFound
        );
        assert_eq!(
            runtime.company_state(&missing).unwrap_err(),
            FloorError::CompanyNotFound
        );
        assert!(matches!(
            runtime
                .ingest_event(work_request(missing))
                .await
                .unwrap_err(),
            FloorError::CompanyNotFound
        ));
        assert!(matches!(
            runtime.cleanup_movements(&missing).await.unwrap_err(),
            FloorError::CompanyNotFound
        ));
    }
}
