//! Ticket-side inputs to the SLA engine: the event trail and the derived
//! record the clock and splitter evaluate.
//!
//! The engine never fetches or stores tickets; callers hand it fully-loaded
//! records with chronologically ordered events.

use crate::types::{ActionKind, RoleTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Markers identifying automated actors. An actor whose name contains one of
/// these is never reported as a human handler.
const AUTOMATED_MARKERS: &[&str] = &["system", "bot", "notification"];

/// True if a display name carries an automated-actor marker.
pub fn is_automated_name(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    AUTOMATED_MARKERS.iter().any(|m| name.contains(m))
}

// ---------------------------------------------------------------------------
// ActorRef
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<RoleTier>,
}

impl ActorRef {
    pub fn is_automated(&self) -> bool {
        is_automated_name(&self.name)
    }
}

// ---------------------------------------------------------------------------
// TrailEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailEvent {
    pub at: DateTime<Utc>,
    pub actor: ActorRef,
    #[serde(flatten)]
    pub kind: ActionKind,
}

// ---------------------------------------------------------------------------
// TicketRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub priority: String,
    /// Code of the status the ticket currently sits in.
    pub current_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<ActorRef>,
    /// Chronologically ordered trail.
    #[serde(default)]
    pub events: Vec<TrailEvent>,
}

impl TicketRecord {
    /// Status the ticket started in: the `from` of the earliest status
    /// change, or the current status if it never moved.
    pub fn initial_status(&self) -> &str {
        self.events
            .iter()
            .find_map(|e| match &e.kind {
                ActionKind::StatusChanged { from, .. } => Some(from.as_str()),
                _ => None,
            })
            .unwrap_or(&self.current_status)
    }

    pub fn status_changes(&self) -> impl Iterator<Item = (&TrailEvent, &str, &str)> {
        self.events.iter().filter_map(|e| match &e.kind {
            ActionKind::StatusChanged { from, to } => Some((e, from.as_str(), to.as_str())),
            _ => None,
        })
    }

    /// Latest escalation event, if any. Notifications are a distinct variant
    /// and can never match.
    pub fn latest_escalation(&self) -> Option<&TrailEvent> {
        self.events.iter().rev().find(|e| e.kind.is_escalation())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn actor(name: &str) -> ActorRef {
        ActorRef {
            id: name.to_string(),
            name: name.to_string(),
            tier: None,
        }
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap()
    }

    #[test]
    fn automated_actor_markers() {
        assert!(actor("SLA Notification Service").is_automated());
        assert!(actor("helpdesk-bot").is_automated());
        assert!(actor("System").is_automated());
        assert!(!actor("Dana Reyes").is_automated());
    }

    #[test]
    fn initial_status_from_earliest_change() {
        let record = TicketRecord {
            id: "T-1".into(),
            created_at: at(0),
            priority: "high".into(),
            current_status: "resolved".into(),
            assignee: None,
            events: vec![
                TrailEvent {
                    at: at(5),
                    actor: actor("dana"),
                    kind: ActionKind::StatusChanged {
                        from: "new".into(),
                        to: "in_progress".into(),
                    },
                },
                TrailEvent {
                    at: at(30),
                    actor: actor("dana"),
                    kind: ActionKind::StatusChanged {
                        from: "in_progress".into(),
                        to: "resolved".into(),
                    },
                },
            ],
        };
        assert_eq!(record.initial_status(), "new");
    }

    #[test]
    fn initial_status_defaults_to_current() {
        let record = TicketRecord {
            id: "T-2".into(),
            created_at: at(0),
            priority: "low".into(),
            current_status: "new".into(),
            assignee: None,
            events: vec![],
        };
        assert_eq!(record.initial_status(), "new");
    }

    #[test]
    fn latest_escalation_wins() {
        let record = TicketRecord {
            id: "T-3".into(),
            created_at: at(0),
            priority: "high".into(),
            current_status: "in_progress".into(),
            assignee: None,
            events: vec![
                TrailEvent {
                    at: at(10),
                    actor: actor("dana"),
                    kind: ActionKind::Escalated {
                        target: Some("Priya".into()),
                    },
                },
                TrailEvent {
                    at: at(20),
                    actor: actor("sla-notification"),
                    kind: ActionKind::Notification,
                },
                TrailEvent {
                    at: at(40),
                    actor: actor("dana"),
                    kind: ActionKind::Escalated {
                        target: Some("Marco".into()),
                    },
                },
            ],
        };
        let esc = record.latest_escalation().unwrap();
        assert_eq!(esc.at, at(40));
    }
}
