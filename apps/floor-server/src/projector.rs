use serde_json::Value;

use crate::inference::{Action, ActionVerb, ACTIVE_WORK_STATUSES};
use crate::models::Agent;

/// Applies an inferred action sequence to a company's live agent records.
///
/// Tokens are applied strictly in sequence, so a later token for the same
/// agent wins. Tokens naming an agent that cannot be resolved are dropped
/// without error: token generation and agent resolution are deliberately
/// decoupled, and the feed stays best-effort.
pub fn apply(actions: &[Action], agents: &mut [Agent], payload: &Value) {
    for action in actions {
        match action.verb {
            ActionVerb::Status => {
                let agent = match agents.iter_mut().find(|a| a.agent_id == action.agent) {
                    Some(agent) => agent,
                    None => continue,
                };
                let status = match action.arg.as_deref() {
                    Some(status) => status,
                    None => continue,
                };

                agent.status = status.to_string();

                if status == "idle" {
                    agent.current_task = None;
                } else if ACTIVE_WORK_STATUSES.contains(&status) {
                    let task = payload
                        .get("task")
                        .and_then(Value::as_str)
                        .or_else(|| payload.get("thought").and_then(Value::as_str));
                    if let Some(task) = task {
                        agent.current_task = Some(task.to_string());
                    }
                }
            }
            ActionVerb::WalkTo => {
                if let Some(agent) = agents.iter_mut().find(|a| a.agent_id == action.agent) {
                    agent.status = "walking".to_string();
                }
            }
            // handoff / return / task_complete / acknowledge / custom are
            // animation cues only; no agent state changes here.
            _ => {}
        }
    }
}
