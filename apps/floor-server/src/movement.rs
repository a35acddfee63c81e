use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::inference::{Action, ActionVerb};
use crate::models::{Agent, Movement};
use crate::zones;

/// Builds the movement records for one event's courier actions.
///
/// Zones are read from snapshots taken before the projector runs, so the
/// endpoints reflect where the agents stood when the event arrived. Both
/// movement kinds require a resolved target: an event without `to_agent`
/// produces no movements no matter which tokens were emitted.
pub fn synthesize(
    actions: &[Action],
    actor: &Agent,
    target: Option<&Agent>,
    payload: &Value,
) -> Vec<Movement> {
    let target = match target {
        Some(target) => target,
        None => return Vec::new(),
    };

    let mut movements = Vec::new();
    for action in actions {
        if action.agent != actor.agent_id {
            continue;
        }
        match action.verb {
            ActionVerb::WalkTo => movements.push(Movement {
                id: Uuid::new_v4(),
                agent_id: actor.agent_id.clone(),
                from_zone: actor.position_zone.clone(),
                to_zone: target.position_zone.clone(),
                purpose: "handoff".to_string(),
                artifact: payload
                    .get("artifact")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                progress: 0.0,
                created_at: Utc::now().to_rfc3339(),
            }),
            ActionVerb::Return => movements.push(Movement {
                id: Uuid::new_v4(),
                agent_id: actor.agent_id.clone(),
                from_zone: target.position_zone.clone(),
                // The way back always ends at the actor's home desk, not
                // wherever they happened to stand before.
                to_zone: zones::home_zone(&actor.role).to_string(),
                purpose: "return".to_string(),
                artifact: None,
                progress: 0.0,
                created_at: Utc::now().to_rfc3339(),
            }),
            _ => {}
        }
    }
    movements
}
