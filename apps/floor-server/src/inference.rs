use serde_json::Value;
use std::fmt;

use crate::models::EventCreate;

/// Event types following the courier pattern: the sender walks to the
/// target, hands the work over and returns to their desk.
const COURIER_TYPES: &[&str] = &[
    "WORK_REQUEST",
    "WORK_COMPLETE",
    "REVIEW_REQUEST",
    "FEEDBACK",
    "MESSAGE_SEND",
];

/// Event types mapping 1:1 onto an agent status.
const STATUS_TYPES: &[&str] = &[
    "THINKING",
    "WORKING",
    "EXECUTING",
    "IDLE",
    "ERROR",
    "CODING",
    "DISCUSSING",
    "REVIEWING",
    "BREAK",
];

/// Statuses that represent active work. A status token landing on one of
/// these captures the task text from the event payload.
pub const ACTIVE_WORK_STATUSES: &[&str] = &[
    "working",
    "thinking",
    "executing",
    "coding",
    "discussing",
    "reviewing",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionVerb {
    Status,
    WalkTo,
    Handoff,
    Return,
    TaskComplete,
    Acknowledge,
    Custom,
}

impl fmt::Display for ActionVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionVerb::Status => "status",
            ActionVerb::WalkTo => "walk_to",
            ActionVerb::Handoff => "handoff",
            ActionVerb::Return => "return",
            ActionVerb::TaskComplete => "task_complete",
            ActionVerb::Acknowledge => "acknowledge",
            ActionVerb::Custom => "custom",
        };
        write!(f, "{}", name)
    }
}

/// One inferred unit of visual/state effect. Kept structured internally;
/// `Display` renders the `subject:verb:arg` form the activity feed stores,
/// and nothing ever parses that string back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub agent: String,
    pub verb: ActionVerb,
    pub arg: Option<String>,
}

impl Action {
    fn status(agent: &str, status: &str) -> Self {
        Action {
            agent: agent.to_string(),
            verb: ActionVerb::Status,
            arg: Some(status.to_string()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}:{}:{}", self.agent, self.verb, arg),
            None => write!(f, "{}:{}", self.agent, self.verb),
        }
    }
}

/// Canonical form of an event type. The event record, the type tables and
/// the log filter all agree on this form.
pub fn canonical_event_type(event_type: &str) -> String {
    event_type.to_ascii_uppercase()
}

/// Maps a business event to its ordered action sequence.
///
/// Pure and total: depends only on the event itself, and every
/// syntactically valid event yields at least one token. Unknown types
/// degrade to a status change instead of being rejected.
pub fn infer(event: &EventCreate) -> Vec<Action> {
    let event_type = canonical_event_type(&event.event_type);

    if COURIER_TYPES.contains(&event_type.as_str()) {
        return match &event.to_agent {
            Some(target) => vec![
                Action {
                    agent: event.agent_id.clone(),
                    verb: ActionVerb::WalkTo,
                    arg: Some(target.clone()),
                },
                Action {
                    agent: event.agent_id.clone(),
                    verb: ActionVerb::Handoff,
                    arg: Some(target.clone()),
                },
                Action {
                    agent: event.agent_id.clone(),
                    verb: ActionVerb::Return,
                    arg: None,
                },
                Action::status(target, "working"),
            ],
            // Nobody to deliver to: degrade to a plain status change.
            None => vec![Action::status(&event.agent_id, "working")],
        };
    }

    if STATUS_TYPES.contains(&event_type.as_str()) {
        return vec![Action::status(
            &event.agent_id,
            &event_type.to_ascii_lowercase(),
        )];
    }

    match event_type.as_str() {
        "TASK_COMPLETE" => vec![
            Action::status(&event.agent_id, "idle"),
            // Fire-once cue for the client; carries no state mutation.
            Action {
                agent: event.agent_id.clone(),
                verb: ActionVerb::TaskComplete,
                arg: None,
            },
        ],
        "MESSAGE_RECEIVE" => vec![Action {
            agent: event.agent_id.clone(),
            verb: ActionVerb::Acknowledge,
            arg: None,
        }],
        "CUSTOM_EVENT" => {
            let name = event
                .payload
                .get("event_name")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or("custom");
            vec![Action {
                agent: event.agent_id.clone(),
                verb: ActionVerb::Custom,
                arg: Some(name.to_string()),
            }]
        }
        _ => {
            let status = event
                .payload
                .get("agent_state")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or("working");
            vec![Action::status(&event.agent_id, status)]
        }
    }
}
